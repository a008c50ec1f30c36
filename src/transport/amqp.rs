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

//! GELF over AMQP.
//!
//! This crate doesn't speak AMQP itself. The caller supplies an [`AmqpExchange`] (typically a
//! thin wrapper around a channel from their AMQP client of choice) & [`AmqpTransport`] hands it
//! each encoded message along with the routing key & message properties Graylog's AMQP input
//! expects.

use crate::{
    encoder::{Encoder, JsonEncoder},
    error::Result,
    standard::FieldMap,
    transport::Transport,
};

use tracing::trace;

/// Content type attached to every published message
pub const CONTENT_TYPE: &str = "application/json";
/// AMQP delivery mode asking the broker to persist the message
pub const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Message properties accompanying each publication
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmqpProperties {
    pub content_type: &'static str,
    pub delivery_mode: u8,
}

impl std::default::Default for AmqpProperties {
    fn default() -> Self {
        AmqpProperties {
            content_type: CONTENT_TYPE,
            delivery_mode: DELIVERY_MODE_PERSISTENT,
        }
    }
}

/// An AMQP exchange to which messages can be published.
///
/// Implementations report broker failures as [`Error::transport`](crate::Error::transport).
pub trait AmqpExchange {
    fn publish(&self, body: &[u8], routing_key: &str, properties: &AmqpProperties) -> Result<()>;
}

impl<F> AmqpExchange for F
where
    F: Fn(&[u8], &str, &AmqpProperties) -> Result<()>,
{
    fn publish(&self, body: &[u8], routing_key: &str, properties: &AmqpProperties) -> Result<()> {
        self(body, routing_key, properties)
    }
}

/// Publishing GELF messages to an AMQP exchange
pub struct AmqpTransport<E> {
    exchange: E,
    routing_key: String,
    properties: AmqpProperties,
    encoder: Box<dyn Encoder + Send + Sync>,
}

impl<E: AmqpExchange> AmqpTransport<E> {
    /// Publish to `exchange`, routed to the queue named `routing_key`
    pub fn new(exchange: E, routing_key: impl Into<String>) -> AmqpTransport<E> {
        AmqpTransport {
            exchange,
            routing_key: routing_key.into(),
            properties: AmqpProperties::default(),
            encoder: Box::new(JsonEncoder),
        }
    }
    pub fn with_encoder<C: Encoder + Send + Sync + 'static>(mut self, encoder: C) -> Self {
        self.encoder = Box::new(encoder);
        self
    }
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
    pub fn exchange(&self) -> &E {
        &self.exchange
    }
}

impl<E: AmqpExchange> Transport for AmqpTransport<E> {
    fn send(&self, fields: &FieldMap) -> Result<usize> {
        let body = self.encoder.encode(fields)?;
        trace!("Publishing {} bytes to {}", body.len(), self.routing_key);
        self.exchange
            .publish(&body, &self.routing_key, &self.properties)?;
        Ok(body.len())
    }
}
