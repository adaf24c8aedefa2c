//! # PubHub
//!
//! `pubhub` is an in-process publish/subscribe broker. Topics come into
//! existence on first subscription, subscribers each own a bounded mailbox,
//! and a published message is fanned out to every subscriber that belongs to
//! the topic at the moment of publishing.
//!
//! ```no_run
//! # async fn example() {
//! use pubhub::broker::Broker;
//!
//! let broker = Broker::new();
//! let sub = broker.add_subscriber(16);
//! broker.subscribe(&sub, "orders");
//!
//! broker.publish("orders", "m1").unwrap();
//! sub.done();
//! sub.listen().await;
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - `broker`: the registry, topic index, subscribers, mailboxes and message fan-out.
//! - `config`: loading and merging settings from files and environment variables.
//! - `demo`: a driver that exercises the broker on a timer, used by the binary.
//! - `utils`: the error type and logging bootstrap.

pub mod broker;
pub mod config;
pub mod demo;
pub mod utils;

pub use broker::{Broker, Delivery, Message, Subscriber};
pub use utils::error::BrokerError;
