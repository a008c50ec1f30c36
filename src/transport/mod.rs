// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-publisher.
//
// gelf-publisher is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-publisher is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-publisher.  If
// not, see <http://www.gnu.org/licenses/>.

//! The GELF transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support. A transport
//! takes a serialized message (a [`FieldMap`]), encodes it & moves it to a collector:
//!
//! - [`udp::UdpTransport`]: fire-and-forget datagrams, chunked when large
//! - [`tcp::TcpTransport`]: NUL-terminated JSON over a persistent (optionally TLS) connection
//! - [`http::HttpTransport`]: `POST` requests over a persistent (optionally TLS, optionally
//!   proxied) connection
//! - [`amqp::AmqpTransport`]: hands the encoded message to a caller-supplied broker exchange
//!
//! Two decorators wrap any of the above: [`retry::RetryTransportWrapper`] &
//! [`ignore::ErrorIgnoringTransportWrapper`].
//!
//! # Examples
//!
//! To send GELF messages over UDP to a collector listening on port 12201 (the default) on
//! localhost:
//!
//! ```rust
//! use gelf_publisher::transport::udp::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use gelf_publisher::transport::udp::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.io:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

pub mod amqp;
pub mod http;
pub mod ignore;
pub mod retry;
pub mod socket;
pub mod tcp;
pub mod tls;
pub mod udp;

use crate::{error::Result, standard::FieldMap};

use std::sync::Arc;

/// Host assumed when none is given
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// The customary port for GELF inputs
pub const DEFAULT_PORT: u16 = 12201;
/// The customary port for TLS-protected GELF inputs; also the HTTP transport's default port
pub const DEFAULT_SSL_PORT: u16 = 12202;
/// Request path for the HTTP transport
pub const DEFAULT_PATH: &str = "/gelf";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Encode `fields` & send them on this transport mechanism, returning the number of bytes
    /// written.
    fn send(&self, fields: &FieldMap) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        (**self).send(fields)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        (**self).send(fields)
    }
}
