//! Message definitions for the broker
//!
//! `Message` is the envelope fanned out to subscribers. It is validated once
//! at construction and never mutated afterwards, so a single value can be
//! cloned into every delivery of a publish. The body is kept as [`Bytes`],
//! which makes those clones reference-counted rather than copies.

use std::borrow::Cow;

use bytes::Bytes;

use crate::utils::error::BrokerError;

/// A published message: a non-empty topic plus an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    topic: String,
    body: Bytes,
}

impl Message {
    /// Build a message, rejecting an empty topic with [`BrokerError::InvalidTopic`].
    pub fn new(topic: impl Into<String>, body: impl Into<Bytes>) -> Result<Self, BrokerError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(BrokerError::InvalidTopic);
        }
        Ok(Self {
            topic,
            body: body.into(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body decoded as UTF-8; invalid sequences are replaced with U+FFFD.
    pub fn body_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
