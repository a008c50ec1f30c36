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

//! GELF standards: validation & serialization.
//!
//! This module defines the [`Standard`] trait, along with the rules every GELF version shares.
//!
//! # Introduction
//!
//! The translation from a [`Message`] to bytes on the network occurs in three parts:
//!
//! 1. validating the message & laying it out as a map of GELF fields ([`Standard`])
//!
//! 2. encoding that map as (possibly compressed) JSON ([`Encoder`])
//!
//! 3. transporting the bytes to a collector, with whatever framing the protocol calls for
//!    ([`Transport`])
//!
//! GELF has gone through two versions, [1.0] and [1.1], which agree on the mandatory fields but
//! disagree on what to do with `facility`, `file` & `line` and on what an additional field may
//! be called & contain. Each version is a separate, stateless implementation of [`Standard`]:
//! [`Gelf10`] and [`Gelf11`].
//!
//! [`Encoder`]: crate::encoder::Encoder
//! [`Transport`]: crate::transport::Transport
//! [`Gelf10`]: crate::gelf10::Gelf10
//! [`Gelf11`]: crate::gelf11::Gelf11
//! [1.0]: https://github.com/Graylog2/graylog2-docs/wiki/GELF/6d7ea8f5bb20a1df70e5b9ccaa1d4e8e8e1a40dd
//! [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! # Empty versus falsy
//!
//! Fields that are absent or hold the empty string are left out of the serialized map. Fields
//! holding `false`, `0` or `"0"` are *present* and are always kept.

use crate::{
    error::{Error, Result},
    message::{Message, Version},
};

use serde_json::Value as Json;

/// The serialized form of a [`Message`]: GELF field name to JSON value, in insertion order.
pub type FieldMap = serde_json::Map<String, Json>;

/// Operations all GELF standards must support
pub trait Standard {
    /// The version this standard implements
    fn version(&self) -> Version;
    /// Check `msg` against the rules of this standard
    fn validate(&self, msg: &Message) -> Result<()>;
    /// Validate `msg`, then lay it out as a map of GELF fields
    fn serialize(&self, msg: &Message) -> Result<FieldMap>;
}

/// Additional field name no version of GELF permits (collectors assign their own `_id`).
pub const RESERVED_KEY: &str = "id";

/// Rules shared by every version: a host, a short message & no `id` field.
pub(crate) fn validate_common(msg: &Message) -> Result<()> {
    if msg.host().is_empty() {
        return Err(Error::validation("host not set"));
    }
    if msg.short_message().is_empty() {
        return Err(Error::validation("short_message not set"));
    }
    for (key, _) in msg.additionals() {
        if key.is_empty() {
            return Err(Error::validation("additional field key cannot be empty"));
        }
        if key == RESERVED_KEY {
            return Err(Error::validation(format!(
                "additional field key '{}' is reserved",
                RESERVED_KEY
            )));
        }
    }
    Ok(())
}

/// Insert `value` under `key` unless it is null or the empty string.
pub(crate) fn insert_present(map: &mut FieldMap, key: impl Into<String>, value: Json) {
    let present = match &value {
        Json::Null => false,
        Json::String(s) => !s.is_empty(),
        _ => true,
    };
    if present {
        map.insert(key.into(), value);
    }
}

/// The fields both versions emit: `version, host, short_message, full_message, level, timestamp`.
pub(crate) fn base_fields(msg: &Message, version: Version) -> FieldMap {
    let mut map = FieldMap::new();
    insert_present(&mut map, "version", Json::from(version.as_str()));
    insert_present(&mut map, "host", Json::from(msg.host()));
    insert_present(&mut map, "short_message", Json::from(msg.short_message()));
    insert_present(
        &mut map,
        "full_message",
        msg.full_message().map(Json::from).unwrap_or(Json::Null),
    );
    insert_present(&mut map, "level", Json::from(msg.level().syslog()));
    insert_present(&mut map, "timestamp", Json::from(msg.timestamp_secs()));
    map
}
