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

//! syslog severity levels.
//!
//! GELF carries the severity of a message as a syslog level: an integer from 0 (emergency)
//! through 7 (debug). Callers coming from logging facades tend to think in terms of level
//! *names* instead, so [`Level`] converts in both directions through a single, immutable
//! table ([`LEVEL_NAMES`]) whose index is the syslog level.

use crate::error::{Error, Result};

type StdResult<T, E> = std::result::Result<T, E>;

/// Level names, indexed by syslog level.
pub const LEVEL_NAMES: [&str; 8] = [
    "emergency",
    "alert",
    "critical",
    "error",
    "warning",
    "notice",
    "info",
    "debug",
];

/// The eight syslog severity levels. The enumeration values duplicate the constants documented
/// as per the `syslog()` manual [page] & defined in `<syslog.h>`.
///
/// [page]: https://man7.org/linux/man-pages/man3/syslog.3.html
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// system is unusable
    LOG_EMERG = 0,
    /// action must be take immediately
    LOG_ALERT = 1,
    /// critical conditions
    LOG_CRIT = 2,
    /// error conditions
    LOG_ERR = 3,
    /// warning conditions
    LOG_WARNING = 4,
    /// normal, but significant condition
    LOG_NOTICE = 5,
    /// informational message
    LOG_INFO = 6,
    /// debug-level message
    LOG_DEBUG = 7,
}

const LEVELS: [Level; 8] = [
    Level::LOG_EMERG,
    Level::LOG_ALERT,
    Level::LOG_CRIT,
    Level::LOG_ERR,
    Level::LOG_WARNING,
    Level::LOG_NOTICE,
    Level::LOG_INFO,
    Level::LOG_DEBUG,
];

impl Level {
    /// Look-up the level for syslog severity `level`; anything outside 0-7 is an error.
    pub fn from_syslog(level: i64) -> Result<Level> {
        usize::try_from(level)
            .ok()
            .and_then(|idx| LEVELS.get(idx).copied())
            .ok_or_else(|| Error::level(level))
    }
    /// Look-up a level by (case-insensitive) name, e.g. "Warning"
    pub fn from_name(name: &str) -> Result<Level> {
        LEVEL_NAMES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|idx| LEVELS[idx])
            .ok_or_else(|| Error::level(name))
    }
    /// The syslog severity for this level
    pub fn syslog(&self) -> u8 {
        *self as u8
    }
    /// The (lower-case) name for this level
    pub fn name(&self) -> &'static str {
        LEVEL_NAMES[*self as usize]
    }
}

impl std::default::Default for Level {
    /// GELF collectors assume `alert` when a message doesn't say otherwise, so we do too.
    fn default() -> Self {
        Level::LOG_ALERT
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Level {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Level::from_name(s)
    }
}

impl std::convert::TryFrom<&str> for Level {
    type Error = Error;
    fn try_from(s: &str) -> Result<Self> {
        Level::from_name(s)
    }
}

impl std::convert::TryFrom<String> for Level {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> {
        Level::from_name(&s)
    }
}

macro_rules! level_from_int {
    ($($t:ty),*) => {
        $(
            impl std::convert::TryFrom<$t> for Level {
                type Error = Error;
                fn try_from(level: $t) -> Result<Self> {
                    i64::try_from(level)
                        .map_err(|_| Error::level(level))
                        .and_then(Level::from_syslog)
                }
            }
        )*
    };
}

level_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl std::convert::From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.syslog()
    }
}

/// Map a syslog severity to its name
pub fn level_to_name(level: i64) -> Result<&'static str> {
    Level::from_syslog(level).map(|level| level.name())
}

/// Map a level name to its syslog severity
pub fn name_to_level(name: &str) -> Result<u8> {
    Level::from_name(name).map(|level| level.syslog())
}
