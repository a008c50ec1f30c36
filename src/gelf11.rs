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

//! GELF 1.1 message layout
//! =======================
//!
//! [`Gelf11`] is a [`Standard`] that lays out messages according to GELF [1.1]. The 1.0-era
//! `facility`, `file` & `line` fields were deprecated by 1.1, and are sent as the additional
//! fields `_facility`, `_file` & `_line`.
//!
//! [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! GELF 1.1 requires additional field names to match `^[\w\.\-]*$` (ASCII word characters
//! only) and their values to be
//! strings or numbers. Numbers are sent as-is & everything else is run through
//! [`stringify`](crate::value::stringify); in strict mode, a value that is neither a string nor
//! a number fails validation instead.

use crate::{
    error::{Error, Result},
    message::{Message, Version},
    standard::{base_fields, insert_present, validate_common, FieldMap, Standard},
    value::{stringify, Value},
};

use regex::Regex;
use serde_json::Value as Json;

lazy_static! {
    static ref ADDITIONAL_KEY: Regex =
        Regex::new(r"^[A-Za-z0-9_.\-]*$").expect("additional field pattern is a valid regex");
}

/// The GELF 1.1 [`Standard`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Gelf11 {
    strict: bool,
}

impl Gelf11 {
    /// The lenient flavor: non-numeric values are stringified
    pub fn new() -> Gelf11 {
        Gelf11 { strict: false }
    }
    /// The strict flavor: non-numeric, non-string values fail validation
    pub fn strict() -> Gelf11 {
        Gelf11 { strict: true }
    }
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn field_value(value: &Value) -> Json {
        match value {
            Value::Number(n) => Json::Number(n.clone()),
            Value::Null => Json::Null,
            other => Json::String(stringify(other)),
        }
    }
}

impl Standard for Gelf11 {
    fn version(&self) -> Version {
        Version::V1_1
    }

    fn validate(&self, msg: &Message) -> Result<()> {
        validate_common(msg)?;
        for (key, value) in msg.additionals() {
            if !ADDITIONAL_KEY.is_match(key) {
                return Err(Error::validation(format!(
                    "additional field key {:?} contains characters other than letters, digits, '_', '.' & '-'",
                    key
                )));
            }
            if self.strict && !(value.is_number() || value.is_string()) {
                return Err(Error::validation(format!(
                    "additional field {:?} is neither a string nor a number",
                    key
                )));
            }
        }
        Ok(())
    }

    fn serialize(&self, msg: &Message) -> Result<FieldMap> {
        self.validate(msg)?;

        let mut map = base_fields(msg, self.version());
        for (key, value) in msg.additionals() {
            insert_present(&mut map, format!("_{}", key), Gelf11::field_value(value));
        }
        // The message's own legacy fields take precedence over like-named additionals.
        if let Some(facility) = msg.facility() {
            insert_present(&mut map, "_facility", Json::from(facility));
        }
        if let Some(file) = msg.file() {
            insert_present(&mut map, "_file", Json::from(file));
        }
        if let Some(line) = msg.line() {
            insert_present(&mut map, "_line", Json::from(line));
        }
        Ok(map)
    }
}
