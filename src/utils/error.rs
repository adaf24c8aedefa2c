//! The `error` module defines the error types surfaced by the broker.
//!
//! Only malformed input is an error. Publishing to a topic nobody listens on,
//! delivering to a finished subscriber or hitting a full mailbox are all
//! normal outcomes and never show up here.

use thiserror::Error;

/// Errors returned by [`Message::new`](crate::broker::message::Message::new)
/// and [`Broker::publish`](crate::broker::Broker::publish).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The topic name was empty.
    #[error("undefined topic")]
    InvalidTopic,
}

#[cfg(test)]
mod tests {
    use super::BrokerError;

    #[test]
    fn test_invalid_topic_display() {
        assert_eq!(BrokerError::InvalidTopic.to_string(), "undefined topic");
    }
}
