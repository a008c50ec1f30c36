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

//! The GELF message.
//!
//! [`Message`] is the in-memory form of a single GELF log entry. It is a plain value: it knows
//! nothing about the wire, and any rules about what makes a message acceptable live in the
//! [`Standard`] implementations. The one exception is that an additional field may never have an
//! empty name; [`Message::set_additional`] refuses those up-front.
//!
//! [`Standard`]: crate::standard::Standard

use crate::{
    error::{Error, Result},
    gelf10::Gelf10,
    gelf11::Gelf11,
    level::Level,
    standard::{FieldMap, Standard},
    value::Value,
};

use chrono::prelude::*;

use std::collections::BTreeMap;

type StdResult<T, E> = std::result::Result<T, E>;

/// The GELF protocol versions we know how to speak
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    V1_0,
    V1_1,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
        }
    }
}

impl std::default::Default for Version {
    fn default() -> Self {
        Version::V1_1
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Version {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.0" => Ok(Version::V1_0),
            "1.1" => Ok(Version::V1_1),
            _ => Err(Error::validation(format!(
                "{:?} is not a supported GELF version",
                s
            ))),
        }
    }
}

lazy_static! {
    static ref DEFAULT_HOST: String = discover_hostname();
}

/// Attempt to figure-out a name for this host.
///
/// The order of preference is:
///
/// 1. [gethostname()]
/// 2. the IP address of the interface that would be used to reach the outside world
/// 3. "localhost"
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
fn discover_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|hn| hn.into_string().ok())
        .filter(|hn| !hn.is_empty())
        .or_else(|| {
            local_ip_address::local_ip()
                .ok()
                .map(|ip| ip.to_string())
        })
        .unwrap_or_else(|| "localhost".to_owned())
}

/// One GELF log entry
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    version: Version,
    host: String,
    short_message: String,
    full_message: Option<String>,
    timestamp: DateTime<Utc>,
    level: Level,
    facility: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    additional: BTreeMap<String, Value>,
}

impl std::default::Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

impl Message {
    /// A new, empty message stamped with the current time & the local hostname
    pub fn new() -> Message {
        Message {
            version: Version::default(),
            host: DEFAULT_HOST.clone(),
            short_message: String::new(),
            full_message: None,
            timestamp: Utc::now(),
            level: Level::default(),
            facility: None,
            file: None,
            line: None,
            additional: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }
    /// Choose the rules [`to_field_map`](Message::to_field_map) applies; a
    /// [`Publisher`](crate::publisher::Publisher) uses its own [`Standard`] regardless.
    pub fn set_version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn set_host(&mut self, host: impl Into<String>) -> &mut Self {
        self.host = host.into();
        self
    }

    pub fn short_message(&self) -> &str {
        &self.short_message
    }
    /// Anything with a textual form will do, so `0` is as good a short message as `"0"`.
    pub fn set_short_message(&mut self, short_message: impl ToString) -> &mut Self {
        self.short_message = short_message.to_string();
        self
    }

    pub fn full_message(&self) -> Option<&str> {
        self.full_message.as_deref()
    }
    pub fn set_full_message(&mut self, full_message: impl Into<String>) -> &mut Self {
        self.full_message = Some(full_message.into());
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    /// Seconds since the epoch, with microsecond precision
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.timestamp() as f64
            + f64::from(self.timestamp.timestamp_subsec_micros()) / 1_000_000.0
    }
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<Utc>>) -> &mut Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }
    pub fn level_name(&self) -> &'static str {
        self.level.name()
    }
    pub fn set_level(&mut self, level: Level) -> &mut Self {
        self.level = level;
        self
    }
    /// Set the level from either a syslog severity (0-7) or a level name (case-insensitive);
    /// anything else is an [`Error::Level`].
    pub fn set_level_from<L>(&mut self, level: L) -> Result<&mut Self>
    where
        L: TryInto<Level, Error = Error>,
    {
        self.level = level.try_into()?;
        Ok(self)
    }

    pub fn facility(&self) -> Option<&str> {
        self.facility.as_deref()
    }
    pub fn set_facility(&mut self, facility: impl Into<String>) -> &mut Self {
        self.facility = Some(facility.into());
        self
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
    pub fn set_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.file = Some(file.into());
        self
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }
    pub fn set_line(&mut self, line: u32) -> &mut Self {
        self.line = Some(line);
        self
    }

    /// Attach an additional field; a later value for the same key replaces an earlier one.
    pub fn set_additional(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::validation("additional field key cannot be empty"));
        }
        self.additional.insert(key, value.into());
        Ok(self)
    }
    pub fn has_additional(&self, key: &str) -> bool {
        self.additional.contains_key(key)
    }
    pub fn additional(&self, key: &str) -> Option<&Value> {
        self.additional.get(key)
    }
    pub fn remove_additional(&mut self, key: &str) -> Option<Value> {
        self.additional.remove(key)
    }
    pub fn additionals(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.additional.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Validate & serialize this message according to its own [`Version`].
    ///
    /// For GELF 1.1 this uses the lenient (non-strict) rules; build a [`Gelf11`] yourself for
    /// anything else.
    pub fn to_field_map(&self) -> Result<FieldMap> {
        match self.version {
            Version::V1_0 => Gelf10.serialize(self),
            Version::V1_1 => Gelf11::default().serialize(self),
        }
    }
}
