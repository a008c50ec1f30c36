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

//! Values of additional fields.
//!
//! GELF lets a message carry any number of caller-defined "additional" fields. On the wire they
//! are JSON scalars, but callers hand us all sorts of things: booleans, nested maps, errors,
//! handles to open files. [`Value`] models what a caller may attach, and [`stringify`] is the
//! one place that decides how each of those turns into text.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use std::collections::BTreeMap;

/// The value of an additional field (or of a default-context entry on a
/// [`Publisher`](crate::publisher::Publisher)).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    /// Keys keep the order in which they were inserted
    Map(IndexMap<String, Value>),
    /// Something with a textual form of its own: an error, a type implementing `Display`
    Display(String),
    /// Something with no meaningful textual form (a socket, a file handle); only the name of its
    /// type survives
    Opaque(&'static str),
}

impl Value {
    /// Capture `x` through its [`Display`](std::fmt::Display) implementation
    pub fn display<T: std::fmt::Display + ?Sized>(x: &T) -> Value {
        Value::Display(x.to_string())
    }
    /// Capture nothing about `_x` but the name of its type
    pub fn opaque<T: ?Sized>(_x: &T) -> Value {
        Value::Opaque(std::any::type_name::<T>())
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }
    /// True for the empty string; GELF drops such fields rather than sending them
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }
    /// Convert to a JSON value, stringifying the parts JSON has no representation for
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Display(_) | Value::Opaque(_) => serde_json::Value::String(stringify(self)),
        }
    }
}

/// Render `value` as text.
///
/// Rules, in order:
///
/// 1. strings and numbers pass through unchanged
/// 2. booleans, arrays & maps are JSON-encoded (so `true` is `"true"`, never `"1"`)
/// 3. values with a textual form of their own yield that text
/// 4. null yields `"NULL"`
/// 5. anything else yields its type name in brackets, e.g. `"[std::fs::File]"`
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(_) | Value::Array(_) | Value::Map(_) => value.to_json().to_string(),
        Value::Display(s) => s.clone(),
        Value::Null => "NULL".to_owned(),
        Value::Opaque(type_name) => format!("[{}]", type_name),
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Display(_) | Value::Opaque(_) => serializer.serialize_str(&stringify(self)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", stringify(self))
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl std::convert::From<$t> for Value {
                fn from(x: $t) -> Self {
                    Value::Number(Number::from(x))
                }
            }
        )*
    };
}

value_from_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl std::convert::From<f64> for Value {
    /// NaN & the infinities have no JSON representation, so they're kept as text.
    fn from(x: f64) -> Self {
        Number::from_f64(x)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Display(x.to_string()))
    }
}

impl std::convert::From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::from(f64::from(x))
    }
}

impl std::convert::From<bool> for Value {
    fn from(x: bool) -> Self {
        Value::Bool(x)
    }
}

impl std::convert::From<&str> for Value {
    fn from(x: &str) -> Self {
        Value::String(x.to_owned())
    }
}

impl std::convert::From<String> for Value {
    fn from(x: String) -> Self {
        Value::String(x)
    }
}

impl<T: Into<Value>> std::convert::From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        x.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> std::convert::From<Vec<T>> for Value {
    fn from(x: Vec<T>) -> Self {
        Value::Array(x.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> std::convert::From<BTreeMap<String, T>> for Value {
    fn from(x: BTreeMap<String, T>) -> Self {
        Value::Map(x.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> std::convert::From<IndexMap<String, T>> for Value {
    fn from(x: IndexMap<String, T>) -> Self {
        Value::Map(x.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl std::convert::From<serde_json::Value> for Value {
    fn from(x: serde_json::Value) -> Self {
        match x {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
