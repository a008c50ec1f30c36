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

//! A lazily-connected, optionally-encrypted stream socket shared by the TCP & HTTP transports.

use crate::error::{Error, Result};

use rustls::{pki_types::ServerName, ClientConfig, ClientConnection, StreamOwned};
use tracing::{debug, trace};

use std::{
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// Default time allowed for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// An established connection, plain or TLS
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(stream) => stream.read(buf),
            Stream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Stream::Plain(stream) => stream.write(buf),
            Stream::Tls(stream) => stream.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Stream::Plain(stream) => stream.flush(),
            Stream::Tls(stream) => stream.flush(),
        }
    }
}

enum Connection {
    Unconnected,
    Connected(Stream),
}

impl Connection {
    fn stream<F>(&mut self, connect: F) -> Result<&mut Stream>
    where
        F: FnOnce() -> Result<Stream>,
    {
        if let Connection::Unconnected = self {
            *self = Connection::Connected(connect()?);
        }
        match self {
            Connection::Connected(stream) => Ok(stream),
            Connection::Unconnected => Err(Error::transport("not connected")),
        }
    }
}

/// A stream socket that connects on first use & stays connected until it's closed or fails
pub struct StreamSocketClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
    proxy: Option<(String, u16)>,
    state: Mutex<Connection>,
}

impl StreamSocketClient {
    pub fn new(host: impl Into<String>, port: u16) -> StreamSocketClient {
        StreamSocketClient {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tls: None,
            proxy: None,
            state: Mutex::new(Connection::Unconnected),
        }
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }
    pub fn is_proxied(&self) -> bool {
        self.proxy.is_some()
    }
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }
    /// Encrypt the connection (or not); takes effect on the next connect
    pub fn set_tls(&mut self, tls: Option<Arc<ClientConfig>>) {
        self.tls = tls;
        self.reset();
    }
    /// Connect through the proxy at `host`:`port`; takes effect on the next connect
    pub fn set_proxy(&mut self, host: impl Into<String>, port: u16) {
        self.proxy = Some((host.into(), port));
        self.reset();
    }

    /// Run `f` against the connection, connecting first if need be. Any error from either
    /// leaves the client unconnected, so that the next call starts over.
    pub fn with_stream<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Stream) -> Result<T>,
    {
        let mut state = self.lock();
        let result = state.stream(|| self.connect()).and_then(f);
        if result.is_err() {
            *state = Connection::Unconnected;
        }
        result
    }

    /// Write all of `buf`, returning its length
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        self.with_stream(|stream| {
            stream.write_all(buf)?;
            stream.flush()?;
            Ok(buf.len())
        })
    }

    /// Drop the connection, if any; the next write will re-connect
    pub fn close(&self) {
        let mut state = self.lock();
        if let Connection::Connected(_) = *state {
            debug!("Closing connection to {}:{}", self.host, self.port);
        }
        *state = Connection::Unconnected;
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.lock(), Connection::Connected(_))
    }

    // The connection state is valid at every point a panic could interrupt it, so a poisoned
    // lock is simply taken over.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&mut self) {
        *self.state.get_mut().unwrap_or_else(PoisonError::into_inner) = Connection::Unconnected;
    }

    fn connect(&self) -> Result<Stream> {
        let (host, port) = match &self.proxy {
            Some((host, port)) => (host.as_str(), *port),
            None => (self.host.as_str(), self.port),
        };
        let mut sock = connect_tcp(host, port, self.connect_timeout)?;
        debug!("Connected to {}:{}", host, port);

        let config = match &self.tls {
            Some(config) => config.clone(),
            None => return Ok(Stream::Plain(sock)),
        };

        if self.proxy.is_some() {
            tunnel(&mut sock, &self.host, self.port)?;
        }
        let server_name = ServerName::try_from(self.host.clone())
            .map_err(|err| Error::configuration(format!("bad TLS server name: {}", err)))?;
        let conn = ClientConnection::new(config, server_name).map_err(Error::transport)?;
        Ok(Stream::Tls(Box::new(StreamOwned::new(conn, sock))))
    }
}

/// Connect to the first address `host` resolves to that will accept a connection within
/// `timeout`
fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        trace!("Trying {}", addr);
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(sock) => return Ok(sock),
            Err(err) => last_err = Some(err),
        }
    }
    Err(match last_err {
        Some(err) => Error::transport(err),
        None => Error::transport(format!("{} resolved to no addresses", host)),
    })
}

/// Ask an HTTP proxy on `sock` to open a tunnel to `host`:`port`
fn tunnel(sock: &mut TcpStream, host: &str, port: u16) -> Result<()> {
    write!(
        sock,
        "CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n",
        host = host,
        port = port
    )?;
    sock.flush()?;

    // Read a byte at a time so as not to consume anything past the proxy's headers
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if sock.read(&mut byte)? == 0 {
            return Err(Error::transport("proxy closed the connection during CONNECT"));
        }
        head.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&head);
    let status_line = head.lines().next().unwrap_or_default();
    match status_line.split_whitespace().nth(1) {
        Some(code) if code.starts_with('2') => {
            trace!("Tunnel to {}:{} established", host, port);
            Ok(())
        }
        _ => Err(Error::transport(format!(
            "proxy refused CONNECT: {}",
            status_line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{net::TcpListener, thread};

    #[test]
    fn lazy_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            conn.read_to_end(&mut buf).unwrap();
            buf
        });

        let client = StreamSocketClient::new("127.0.0.1", port);
        assert!(!client.is_connected());
        assert_eq!(client.write(b"abc").unwrap(), 3);
        assert!(client.is_connected());
        assert_eq!(client.write(b"def").unwrap(), 3);
        client.close();
        assert!(!client.is_connected());

        assert_eq!(server.join().unwrap(), b"abcdef");
    }

    #[test]
    fn refused() {
        // Grab a free port, then give it up so nothing is listening there
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = StreamSocketClient::new("127.0.0.1", port);
        let err = client.write(b"abc").unwrap_err();
        assert!(err.is_transport());
        assert!(!client.is_connected());
    }

    #[test]
    fn failure_resets() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let _ = listener.accept().unwrap();
        });

        let client = StreamSocketClient::new("127.0.0.1", port);
        let err = client
            .with_stream(|_| -> Result<()> { Err(Error::transport("boom")) })
            .unwrap_err();
        assert!(err.is_transport());
        assert!(!client.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn proxy_tunnel() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let n = conn.read(&mut buf).unwrap();
            conn.write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                .unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let mut sock = TcpStream::connect(("127.0.0.1", port)).unwrap();
        tunnel(&mut sock, "graylog.example.com", 12202).unwrap();
        assert_eq!(
            server.join().unwrap(),
            "CONNECT graylog.example.com:12202 HTTP/1.1\r\nHost: graylog.example.com:12202\r\n\r\n"
        );
    }
}
