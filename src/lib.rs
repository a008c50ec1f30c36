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

//! Validate, encode & ship [GELF] messages to a [Graylog] collector
//!
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org/
//!
//! # Introduction
//!
//! GELF (the Graylog Extended Log Format) is a JSON-based log record format. A record carries a
//! handful of fixed fields (host, short & full message, timestamp, syslog level) plus any number
//! of "additional" fields whose names begin with an underscore. Records may be sent to a
//! collector as UDP datagrams (compressed & split into chunks when large), as NUL-terminated
//! JSON over TCP, as HTTP `POST` requests, or by way of an AMQP broker.
//!
//! This crate is the client side of that exchange. It is organized as a short pipeline, each
//! stage of which is a trait with one or more implementations:
//!
//! 1. a [`Message`](message::Message) is built by the caller
//! 2. a [`Standard`](standard::Standard) ([`Gelf10`](gelf10::Gelf10) or
//!    [`Gelf11`](gelf11::Gelf11)) validates it & lays it out as a map of GELF fields
//! 3. each registered [`Transport`](transport::Transport) turns that map into bytes with an
//!    [`Encoder`](encoder::Encoder) & moves them to the collector
//!
//! The [`Publisher`](publisher::Publisher) ties these together: one message in, serialized once,
//! fanned out to every transport. Transport failures are reported per-transport & may be retried
//! or ignored by wrapping a transport in one of the decorators in [`transport`].
//!
//! Everything here is synchronous: a send blocks until the bytes are written (and, for HTTP,
//! until the collector answers).
//!
//! # Usage
//!
//! ```rust
//! use gelf_publisher::{
//!     level::Level, message::Message, publisher::Publisher, transport::udp::UdpTransport,
//! };
//! use std::sync::Arc;
//!
//! // Send GELF 1.1 messages via UDP to port 12201 on the localhost.
//! let publisher = Publisher::new().with_transport(Arc::new(UdpTransport::local().unwrap()));
//!
//! let mut msg = Message::new();
//! msg.set_short_message("Hello, world!")
//!     .set_level(Level::LOG_INFO)
//!     .set_additional("user_id", 42)
//!     .unwrap();
//! // One outcome per transport
//! let outcomes = publisher.publish(msg).unwrap();
//! assert_eq!(outcomes.len(), 1);
//! ```
//!
//! Transports can also be described by a string, read from the environment or elsewhere:
//!
//! ```no_run
//! use gelf_publisher::{
//!     config::Endpoint, publisher::Publisher, transport::retry::RetryTransportWrapper,
//!     transport::http::HttpTransport,
//! };
//! use std::sync::Arc;
//!
//! let tcp = "tls://graylog.example.com".parse::<Endpoint>().unwrap().build().unwrap();
//! let http = RetryTransportWrapper::http(
//!     HttpTransport::from_url("https://graylog.example.com/gelf").unwrap());
//! let publisher = Publisher::new()
//!     .with_transport(Arc::from(tcp))
//!     .with_transport(Arc::new(http));
//! ```
//!
//! This crate logs nothing on its own account beyond `trace` & `debug`-level diagnostics through
//! the [`tracing`] facade; errors are always returned to the caller.
//!
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod encoder;
pub mod error;
pub mod gelf10;
pub mod gelf11;
pub mod level;
pub mod message;
pub mod publisher;
pub mod standard;
pub mod transport;
pub mod value;

pub use error::{Error, Result};
