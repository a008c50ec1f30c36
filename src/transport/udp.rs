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

//! GELF over UDP.
//!
//! A payload that fits in one datagram is sent as-is. Anything larger is split into chunks,
//! each prefixed by a twelve-byte header:
//!
//! ```text
//! +------+------+---------------------------------------+-----+-------+--------------
//! | 0x1e | 0x0f |          message id (8 bytes)         | seq | count | payload ...
//! +------+------+---------------------------------------+-----+-------+--------------
//! ```
//!
//! `seq` is zero-based & `count` may not exceed [`MAX_CHUNK_COUNT`]. All chunks of one message
//! share a random message id.
//!
//! # Examples
//!
//! ```rust
//! use gelf_publisher::transport::udp::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```

use crate::{
    encoder::{CompressedJsonEncoder, Encoder},
    error::{Error, Result},
    standard::FieldMap,
    transport::{Transport, DEFAULT_HOST, DEFAULT_PORT},
};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// The GELF chunk magic number
pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
/// Bytes of chunk header preceding each chunk's slice of the payload
pub const CHUNK_HEADER_LEN: usize = 12;
/// Collectors discard messages that arrive in more chunks than this
pub const MAX_CHUNK_COUNT: usize = 128;
/// Chunk size safe for most paths across the Internet
pub const CHUNK_SIZE_WAN: usize = 1420;
/// Chunk size for a LAN with a 9000-byte MTU
pub const CHUNK_SIZE_LAN: usize = 8154;

/// Split `payload` into GELF chunks of at most `chunk_size` bytes each (header included), all
/// labelled with `id`.
///
/// Fails with [`Error::MessageTooLarge`] if more than [`MAX_CHUNK_COUNT`] would be needed, or
/// with a configuration error if `chunk_size` leaves no room for payload.
pub fn chunk(payload: &[u8], chunk_size: usize, id: [u8; 8]) -> Result<Vec<Bytes>> {
    if chunk_size <= CHUNK_HEADER_LEN {
        return Err(Error::configuration(format!(
            "a chunk size of {} leaves no room for data",
            chunk_size
        )));
    }
    let data_per_chunk = chunk_size - CHUNK_HEADER_LEN;
    let count = payload.len().div_ceil(data_per_chunk);
    if count > MAX_CHUNK_COUNT {
        return Err(Error::too_large(count));
    }

    Ok(payload
        .chunks(data_per_chunk)
        .enumerate()
        .map(|(seq, data)| {
            let mut buf = BytesMut::with_capacity(CHUNK_HEADER_LEN + data.len());
            buf.put_slice(&CHUNK_MAGIC);
            buf.put_slice(&id);
            // Both fit: seq < count <= 128
            buf.put_u8(seq as u8);
            buf.put_u8(count as u8);
            buf.put_slice(data);
            buf.freeze()
        })
        .collect())
}

/// Sending GELF messages via UDP datagrams
pub struct UdpTransport {
    socket: UdpSocket,
    chunk_size: usize,
    encoder: Box<dyn Encoder + Send + Sync>,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`; messages are compressed &
    /// chunked at [`CHUNK_SIZE_WAN`] bytes.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        let peer = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::transport("UDP address resolved to nothing"))?;
        // Bind to any available port...
        let local = if peer.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)?;
        // and connect to the collector at `peer`:
        socket.connect(peer)?;
        Ok(UdpTransport {
            socket,
            chunk_size: CHUNK_SIZE_WAN,
            encoder: Box::new(CompressedJsonEncoder::default()),
        })
    }
    /// Construct a [`Transport`] implementation via UDP at 127.0.0.1:12201
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new((DEFAULT_HOST, DEFAULT_PORT))
    }
    /// Set the maximum datagram size; zero disables chunking altogether.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size != 0 && chunk_size <= CHUNK_HEADER_LEN {
            return Err(Error::configuration(format!(
                "UDP chunk size must be zero or greater than {}",
                CHUNK_HEADER_LEN
            )));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }
    pub fn with_encoder<E: Encoder + Send + Sync + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Box::new(encoder);
        self
    }
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.peer_addr()?)
    }
}

impl Transport for UdpTransport {
    /// Returns the number of bytes put on the wire, chunk headers included
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        let payload = self.encoder.encode(fields)?;
        if self.chunk_size == 0 || payload.len() <= self.chunk_size {
            return Ok(self.socket.send(&payload)?);
        }

        let chunks = chunk(&payload, self.chunk_size, rand::random())?;
        trace!(
            "Sending {} bytes in {} chunks to {:?}",
            payload.len(),
            chunks.len(),
            self.socket.peer_addr()
        );
        chunks
            .iter()
            .try_fold(0, |sent, dgram| -> Result<usize> {
                Ok(sent + self.socket.send(dgram)?)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::JsonEncoder;

    use byteorder::{BigEndian, ByteOrder};
    use flate2::read::ZlibDecoder;

    use std::{io::Read, time::Duration};

    fn fields(short_message: &str) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("version".into(), "1.1".into());
        map.insert("host".into(), "example.org".into());
        map.insert("short_message".into(), short_message.into());
        map
    }

    fn receiver() -> UdpSocket {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        sock
    }

    #[test]
    fn chunk_layout() {
        let payload: Vec<u8> = (0..250u8).collect();
        let id = 0x0102030405060708u64.to_be_bytes();
        let chunks = chunk(&payload, 112, id).unwrap();

        // 100 bytes of data per chunk
        assert_eq!(chunks.len(), 3);
        let mut reassembled = Vec::new();
        for (i, c) in chunks.iter().enumerate() {
            assert!(c.len() <= 112);
            assert_eq!(&c[..2], &CHUNK_MAGIC);
            assert_eq!(BigEndian::read_u64(&c[2..10]), 0x0102030405060708);
            assert_eq!(c[10] as usize, i);
            assert_eq!(c[11], 3);
            reassembled.extend_from_slice(&c[CHUNK_HEADER_LEN..]);
        }
        assert_eq!(chunks[2].len(), CHUNK_HEADER_LEN + 50);
        assert_eq!(reassembled, payload);
    }

    #[test]
    fn chunk_counts() {
        let id = [0u8; 8];
        for (len, size, expected) in [(100, 112, 1), (101, 112, 2), (1, 13, 1), (128, 13, 128)] {
            let payload = vec![b'x'; len];
            assert_eq!(chunk(&payload, size, id).unwrap().len(), expected);
        }
        assert!(chunk(b"abc", 12, id).unwrap_err().is_configuration());
    }

    #[test]
    fn too_many_chunks() {
        let payload = vec![b'x'; 129];
        let err = chunk(&payload, 13, [0u8; 8]).unwrap_err();
        assert!(err.is_too_large());
        match err {
            Error::MessageTooLarge { chunks, .. } => assert_eq!(chunks, 129),
            _ => panic!("unexpected error {}", err),
        }
    }

    #[test]
    fn bad_chunk_size() {
        let transpo = UdpTransport::local().unwrap();
        assert!(transpo.with_chunk_size(12).is_err());
        let transpo = UdpTransport::local().unwrap().with_chunk_size(0).unwrap();
        assert_eq!(transpo.chunk_size(), 0);
    }

    #[test]
    fn unchunked() {
        let sock = receiver();
        let transpo = UdpTransport::new(sock.local_addr().unwrap())
            .unwrap()
            .with_encoder(JsonEncoder);

        let sent = transpo.send(&fields("Hello, world!")).unwrap();

        let mut buf = [0u8; 2048];
        let n = sock.recv(&mut buf).unwrap();
        assert_eq!(n, sent);
        let json: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(json["short_message"], "Hello, world!");
    }

    #[test]
    fn chunked() {
        let sock = receiver();
        let transpo = UdpTransport::new(sock.local_addr().unwrap())
            .unwrap()
            .with_chunk_size(64)
            .unwrap();

        // Random enough that zlib can't squeeze it into one chunk
        let short_message: String = (0..400)
            .map(|_| char::from(b'a' + rand::random::<u8>() % 26))
            .collect();
        let sent = transpo.send(&fields(&short_message)).unwrap();

        let mut compressed = Vec::new();
        let mut received = 0;
        let mut id = None;
        let mut buf = [0u8; 2048];
        loop {
            let n = sock.recv(&mut buf).unwrap();
            received += n;
            assert!(n <= 64);
            assert_eq!(&buf[..2], &CHUNK_MAGIC);
            let this_id = BigEndian::read_u64(&buf[2..10]);
            assert_eq!(*id.get_or_insert(this_id), this_id);
            compressed.extend_from_slice(&buf[CHUNK_HEADER_LEN..n]);
            // Loopback preserves ordering
            if buf[10] + 1 == buf[11] {
                break;
            }
        }
        assert_eq!(received, sent);

        let mut json = String::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_string(&mut json)
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(json["short_message"], short_message.as_str());
    }

    #[test]
    fn too_large_sends_nothing() {
        let sock = receiver();
        sock.set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let transpo = UdpTransport::new(sock.local_addr().unwrap())
            .unwrap()
            .with_encoder(JsonEncoder)
            .with_chunk_size(13)
            .unwrap();

        let err = transpo.send(&fields(&"x".repeat(200))).unwrap_err();
        assert!(err.is_too_large());
        let mut buf = [0u8; 64];
        assert!(sock.recv(&mut buf).is_err());
    }
}
