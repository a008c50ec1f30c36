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

//! Encoders: from a map of GELF fields to bytes.
//!
//! [`JsonEncoder`] produces plain UTF-8 JSON; [`CompressedJsonEncoder`] produces the same JSON,
//! zlib-compressed. Collectors detect compression from the first two bytes of a payload, so no
//! out-of-band signalling is needed except over HTTP (see
//! [`Encoder::content_encoding`]).

use crate::{
    error::{Error, Result},
    standard::FieldMap,
};

use flate2::write::ZlibEncoder;

use std::io::Write;

/// Operations all encoders must support
pub trait Encoder {
    /// Encode `fields`; failures are reported, never papered-over with partial output.
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>>;
    /// True if the output of this encoder can never contain a NUL byte. Transports that frame
    /// messages with a NUL terminator insist upon this.
    fn is_null_byte_safe(&self) -> bool;
    /// The value for an HTTP `Content-Encoding` header, if any
    fn content_encoding(&self) -> Option<&'static str> {
        None
    }
}

/// Plain JSON.
///
/// Forward slashes & non-ASCII characters are written as-is, not escaped. JSON text never
/// contains a raw NUL (it would be escaped as `\u0000`), so this encoder is null-byte-safe.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>> {
        serde_json::to_vec(fields).map_err(Error::encode)
    }
    fn is_null_byte_safe(&self) -> bool {
        true
    }
}

/// zlib compression level
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionLevel {
    None,
    #[default]
    Default,
    Best,
    Fast,
    /// 0 (none) through 9 (best)
    Value(u32),
}

impl CompressionLevel {
    pub fn as_flate2(&self) -> flate2::Compression {
        match self {
            CompressionLevel::None => flate2::Compression::none(),
            CompressionLevel::Default => flate2::Compression::default(),
            CompressionLevel::Best => flate2::Compression::best(),
            CompressionLevel::Fast => flate2::Compression::fast(),
            CompressionLevel::Value(level) => flate2::Compression::new((*level).min(9)),
        }
    }
}

/// zlib-compressed JSON
#[derive(Copy, Clone, Debug, Default)]
pub struct CompressedJsonEncoder {
    level: CompressionLevel,
}

impl CompressedJsonEncoder {
    pub fn new(level: CompressionLevel) -> CompressedJsonEncoder {
        CompressedJsonEncoder { level }
    }
    pub fn level(&self) -> CompressionLevel {
        self.level
    }
}

impl Encoder for CompressedJsonEncoder {
    fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>> {
        let json = JsonEncoder.encode(fields)?;
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), self.level.as_flate2());
        encoder.write_all(&json).map_err(Error::encode)?;
        encoder.finish().map_err(Error::encode)
    }
    fn is_null_byte_safe(&self) -> bool {
        false
    }
    fn content_encoding(&self) -> Option<&'static str> {
        // Graylog sniffs the payload, so the header need only say "compressed".
        Some("gzip")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::read::ZlibDecoder;
    use serde_json::json;

    use std::io::Read;

    fn fields(value: serde_json::Value) -> FieldMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn json_keeps_falsy_values() {
        let map = fields(json!({"bool-true": true, "bool-false": false, "int-zero": 0}));
        let out = JsonEncoder.encode(&map).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            r#"{"bool-true":true,"bool-false":false,"int-zero":0}"#
        );
    }

    #[test]
    fn json_does_not_escape_slashes_or_unicode() {
        let map = fields(json!({"file": "/var/log/app.log", "short_message": "Hello, 世界!"}));
        let out = JsonEncoder.encode(&map).unwrap();
        assert_eq!(
            std::str::from_utf8(&out).unwrap(),
            r#"{"file":"/var/log/app.log","short_message":"Hello, 世界!"}"#
        );
        assert!(!out.contains(&0));
    }

    #[test]
    fn compressed_round_trip() {
        let map = fields(json!({
            "version": "1.1",
            "host": "example.org",
            "short_message": "A short message",
            "level": 1,
            "_some_info": "foo"
        }));
        for level in [
            CompressionLevel::Default,
            CompressionLevel::None,
            CompressionLevel::Fast,
            CompressionLevel::Best,
            CompressionLevel::Value(4),
        ] {
            let out = CompressedJsonEncoder::new(level).encode(&map).unwrap();
            assert_eq!(out[0], 0x78);
            assert_eq!(((u16::from(out[0]) << 8) + u16::from(out[1])) % 31, 0);

            let mut decompressed = Vec::new();
            ZlibDecoder::new(&out[..])
                .read_to_end(&mut decompressed)
                .unwrap();
            assert_eq!(decompressed, JsonEncoder.encode(&map).unwrap());
        }
    }

    #[test]
    fn null_byte_safety() {
        assert!(JsonEncoder.is_null_byte_safe());
        assert!(!CompressedJsonEncoder::default().is_null_byte_safe());
        assert_eq!(JsonEncoder.content_encoding(), None);
        assert_eq!(
            CompressedJsonEncoder::default().content_encoding(),
            Some("gzip")
        );
    }
}
