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

//! GELF 1.0 message layout
//! =======================
//!
//! [`Gelf10`] is a [`Standard`] that lays out messages according to the original GELF
//! specification. `facility`, `file` & `line` are first-class, top-level fields; additional
//! fields are prefixed with `_` and sent as whatever JSON value they hold.

use crate::{
    error::Result,
    message::{Message, Version},
    standard::{base_fields, insert_present, validate_common, FieldMap, Standard},
};

use serde_json::Value as Json;

/// The GELF 1.0 [`Standard`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Gelf10;

impl Standard for Gelf10 {
    fn version(&self) -> Version {
        Version::V1_0
    }

    fn validate(&self, msg: &Message) -> Result<()> {
        validate_common(msg)
    }

    fn serialize(&self, msg: &Message) -> Result<FieldMap> {
        self.validate(msg)?;

        let mut map = base_fields(msg, self.version());
        insert_present(
            &mut map,
            "facility",
            msg.facility().map(Json::from).unwrap_or(Json::Null),
        );
        insert_present(
            &mut map,
            "file",
            msg.file().map(Json::from).unwrap_or(Json::Null),
        );
        insert_present(
            &mut map,
            "line",
            msg.line().map(Json::from).unwrap_or(Json::Null),
        );
        for (key, value) in msg.additionals() {
            insert_present(&mut map, format!("_{}", key), value.to_json());
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::value::Value;

    use serde_json::json;

    fn message() -> Message {
        let mut msg = Message::new();
        msg.set_version(Version::V1_0)
            .set_host("example.org")
            .set_short_message("A short message")
            .set_timestamp(std::time::UNIX_EPOCH)
            .set_facility("billing")
            .set_file("/src/main.rs")
            .set_line(42);
        msg
    }

    #[test]
    fn top_level_legacy_fields() {
        let map = Gelf10.serialize(&message()).unwrap();
        assert_eq!(
            Json::Object(map),
            json!({
                "version": "1.0",
                "host": "example.org",
                "short_message": "A short message",
                "level": 1,
                "timestamp": 0.0,
                "facility": "billing",
                "file": "/src/main.rs",
                "line": 42
            })
        );
    }

    #[test]
    fn additionals_keep_their_json_type() {
        let mut msg = message();
        msg.set_additional("flag", false)
            .unwrap()
            .set_additional("count", 0)
            .unwrap()
            .set_additional("nothing", Value::Null)
            .unwrap()
            .set_additional("blank", "")
            .unwrap()
            .set_additional("weird key!", "1.0 doesn't mind")
            .unwrap();
        let map = Gelf10.serialize(&msg).unwrap();
        assert_eq!(map["_flag"], json!(false));
        assert_eq!(map["_count"], json!(0));
        assert_eq!(map["_weird key!"], json!("1.0 doesn't mind"));
        assert!(!map.contains_key("_nothing"));
        assert!(!map.contains_key("_blank"));
    }

    #[test]
    fn rejects_reserved_id() {
        let mut msg = message();
        msg.set_additional("id", "abc").unwrap();
        assert!(Gelf10.serialize(&msg).unwrap_err().is_validation());
    }
}
