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

//! GELF over TCP.
//!
//! Each message is JSON followed by a single NUL byte, so the encoder must never emit one
//! itself. The connection is made on the first send & reused until it fails or is
//! [closed](TcpTransport::close).

use crate::{
    encoder::{Encoder, JsonEncoder},
    error::{Error, Result},
    standard::FieldMap,
    transport::{
        socket::StreamSocketClient, tls::SslOptions, Transport, DEFAULT_HOST, DEFAULT_PORT,
        DEFAULT_SSL_PORT,
    },
};

use tracing::trace;

use std::time::Duration;

/// Sending GELF messages over a TCP connection
pub struct TcpTransport {
    socket: StreamSocketClient,
    encoder: Box<dyn Encoder + Send + Sync>,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP to `host`:`port`. Connecting to
    /// [`DEFAULT_SSL_PORT`] turns on TLS with default [`SslOptions`].
    pub fn new(host: impl Into<String>, port: u16) -> Result<TcpTransport> {
        let transpo = TcpTransport {
            socket: StreamSocketClient::new(host, port),
            encoder: Box::new(JsonEncoder),
        };
        if port == DEFAULT_SSL_PORT {
            transpo.with_ssl(&SslOptions::default())
        } else {
            Ok(transpo)
        }
    }
    /// Construct a [`Transport`] implementation via TCP to 127.0.0.1:12201
    pub fn local() -> Result<TcpTransport> {
        TcpTransport::new(DEFAULT_HOST, DEFAULT_PORT)
    }
    pub fn with_ssl(mut self, options: &SslOptions) -> Result<Self> {
        self.socket.set_tls(Some(options.client_config()?));
        Ok(self)
    }
    pub fn without_ssl(mut self) -> Self {
        self.socket.set_tls(None);
        self
    }
    /// Fails with a configuration error if `encoder` could produce a NUL byte
    pub fn with_encoder<E: Encoder + Send + Sync + 'static>(mut self, encoder: E) -> Result<Self> {
        if !encoder.is_null_byte_safe() {
            return Err(Error::configuration(
                "the TCP transport requires a null-byte-safe encoder",
            ));
        }
        self.encoder = Box::new(encoder);
        Ok(self)
    }
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.socket.set_connect_timeout(timeout);
        self
    }
    pub fn host(&self) -> &str {
        self.socket.host()
    }
    pub fn port(&self) -> u16 {
        self.socket.port()
    }
    pub fn is_tls(&self) -> bool {
        self.socket.is_tls()
    }
    pub fn is_connected(&self) -> bool {
        self.socket.is_connected()
    }
    /// Drop the connection; the next send will re-connect
    pub fn close(&self) {
        self.socket.close()
    }
}

impl Transport for TcpTransport {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        let mut buf = self.encoder.encode(fields)?;
        buf.push(0);
        trace!("Sending {} bytes to {}:{}", buf.len(), self.host(), self.port());
        self.socket.write(&buf)
    }
}
