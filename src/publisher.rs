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

//! The [`Publisher`]: validate & serialize a [`Message`] once, then hand it to every
//! registered [`Transport`].
//!
//! # Examples
//!
//! ```rust
//! use gelf_publisher::{message::Message, publisher::Publisher, transport::udp::UdpTransport};
//! use std::sync::Arc;
//!
//! let mut publisher = Publisher::new();
//! publisher.add_transport(Arc::new(UdpTransport::local().unwrap()));
//!
//! let mut msg = Message::new();
//! msg.set_short_message("Hello, world!");
//! msg.set_additional("request_id", 11).unwrap();
//! let outcomes = publisher.publish(msg).unwrap();
//! assert_eq!(outcomes.len(), 1);
//! ```

use crate::{
    error::{Error, Result},
    gelf11::Gelf11,
    message::Message,
    standard::Standard,
    transport::Transport,
    value::Value,
};

use tracing::{trace, warn};

use std::{collections::BTreeMap, sync::Arc};

/// Fan GELF messages out to any number of transports.
///
/// Each transport's outcome is independent: one failing doesn't keep the others from being
/// tried. Wrap individual transports in [`RetryTransportWrapper`] or
/// [`ErrorIgnoringTransportWrapper`] to change how their failures are treated.
///
/// [`RetryTransportWrapper`]: crate::transport::retry::RetryTransportWrapper
/// [`ErrorIgnoringTransportWrapper`]: crate::transport::ignore::ErrorIgnoringTransportWrapper
pub struct Publisher {
    transports: Vec<Arc<dyn Transport + Send + Sync>>,
    standard: Box<dyn Standard + Send + Sync>,
    default_context: BTreeMap<String, Value>,
}

impl std::default::Default for Publisher {
    /// No transports, GELF 1.1 (lenient) & an empty default context
    fn default() -> Self {
        Publisher {
            transports: Vec::new(),
            standard: Box::new(Gelf11::default()),
            default_context: BTreeMap::new(),
        }
    }
}

impl Publisher {
    pub fn new() -> Publisher {
        Publisher::default()
    }
    /// Validate & serialize with `standard` rather than lenient GELF 1.1
    pub fn with_standard<S: Standard + Send + Sync + 'static>(mut self, standard: S) -> Self {
        self.standard = Box::new(standard);
        self
    }
    pub fn with_transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.add_transport(transport);
        self
    }
    /// Additional fields to attach to every message that doesn't already carry them
    pub fn with_default_context<I, K, V>(mut self, context: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.default_context = context
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }
    pub fn set_default_context_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.default_context.insert(key.into(), value.into());
    }
    pub fn default_context(&self) -> &BTreeMap<String, Value> {
        &self.default_context
    }
    pub fn standard(&self) -> &(dyn Standard + Send + Sync) {
        self.standard.as_ref()
    }

    /// Register `transport`; returns false (& does nothing) if that very instance is already
    /// registered.
    pub fn add_transport(&mut self, transport: Arc<dyn Transport + Send + Sync>) -> bool {
        // Compare data pointers only; the same object may be seen through different vtables
        let addr = Arc::as_ptr(&transport) as *const ();
        if self
            .transports
            .iter()
            .any(|t| Arc::as_ptr(t) as *const () == addr)
        {
            return false;
        }
        self.transports.push(transport);
        true
    }
    pub fn transports(&self) -> &[Arc<dyn Transport + Send + Sync>] {
        &self.transports
    }

    /// Publish `message` to every registered transport.
    ///
    /// Fails outright (sending nothing) if there are no transports or the message can't be
    /// serialized; otherwise returns each transport's outcome, in registration order.
    ///
    /// The message is always serialized with this publisher's [`Standard`]; its own
    /// [`version`](Message::version) is ignored here (a mismatch is logged at WARN).
    pub fn publish(&self, message: Message) -> Result<Vec<Result<usize>>> {
        if self.transports.is_empty() {
            return Err(Error::configuration("no transports registered"));
        }
        if message.version() != self.standard.version() {
            warn!(
                "Message is marked GELF {} but will be published as GELF {}",
                message.version().as_str(),
                self.standard.version().as_str()
            );
        }

        let mut message = message;
        for (key, value) in &self.default_context {
            if !message.has_additional(key) {
                message.set_additional(key.as_str(), value.clone())?;
            }
        }

        let fields = self.standard.serialize(&message)?;
        trace!(
            "Publishing {} fields to {} transport(s)",
            fields.len(),
            self.transports.len()
        );
        Ok(self.transports.iter().map(|t| t.send(&fields)).collect())
    }
}
