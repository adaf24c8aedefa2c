//! Subscribers
//!
//! A `Subscriber` is an addressable recipient: it owns a bounded [`Mailbox`],
//! the set of topics it has joined and a one-way Active -> Done flag.
//!
//! Concurrency notes:
//! - the topic set has its own lock, independent of the broker registry
//!   lock. When both are needed the broker lock is always taken first.
//! - `receive` checks the Done flag before enqueueing. A `receive` racing a
//!   `done` may land either way; once `done` has returned, nothing new is
//!   ever enqueued.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};
use uuid::Uuid;

use crate::broker::mailbox::{Delivery, Mailbox};
use crate::broker::message::Message;
use crate::broker::topic::SubscriberId;
use crate::config::OverflowPolicy;

pub struct Subscriber {
    id: SubscriberId,
    mailbox: Mailbox,
    overflow: OverflowPolicy,
    topics: RwLock<HashSet<String>>,
    done: AtomicBool,
}

impl Subscriber {
    /// Create an active subscriber with a mailbox of `capacity` slots.
    ///
    /// Capacity 0 makes every delivery a synchronous hand-off to a running
    /// [`listen`](Self::listen) loop. `overflow` decides what a delivery does
    /// when no slot is free.
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mailbox: Mailbox::new(capacity),
            overflow,
            topics: RwLock::new(HashSet::new()),
            done: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> usize {
        self.mailbox.capacity()
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub(crate) fn add_topic(&self, topic: &str) {
        self.topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic.to_string());
    }

    pub(crate) fn remove_topic(&self, topic: &str) {
        self.topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(topic);
    }

    /// Snapshot of the topics this subscriber currently belongs to.
    pub fn topics(&self) -> HashSet<String> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Try to put `msg` into the mailbox.
    ///
    /// Parks while the mailbox is full (under [`OverflowPolicy::Block`]) and
    /// returns [`Delivery::Dropped`] if the subscriber is or becomes done.
    pub async fn receive(&self, msg: Message) -> Delivery {
        if self.is_done() {
            debug!(
                subscriber = %self.id,
                topic = msg.topic(),
                "subscriber is done, message dropped"
            );
            return Delivery::Dropped;
        }

        let outcome = self.mailbox.push(msg, self.overflow).await;
        if outcome == Delivery::Dropped {
            debug!(subscriber = %self.id, "message dropped by mailbox");
        }
        outcome
    }

    /// Pull the next message, waiting if the mailbox is empty.
    ///
    /// Returns `None` once the subscriber is done and every message accepted
    /// before that has been consumed.
    pub async fn recv(&self) -> Option<Message> {
        self.mailbox.pop().await
    }

    /// Consume and log messages until the subscriber is done.
    pub async fn listen(&self) {
        self.listen_with(|_| {}).await
    }

    /// Like [`listen`](Self::listen), handing every message to `on_message`
    /// after it is logged.
    pub async fn listen_with<F>(&self, mut on_message: F)
    where
        F: FnMut(Message),
    {
        while let Some(msg) = self.recv().await {
            info!(
                subscriber = %self.id,
                topic = msg.topic(),
                body = %msg.body_as_str(),
                "received message"
            );
            on_message(msg);
        }
        debug!(subscriber = %self.id, "listen loop finished");
    }

    /// Move to the terminal state. Safe to call any number of times.
    pub fn done(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        self.mailbox.close();
        info!(subscriber = %self.id, "subscriber done");
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("overflow", &self.overflow)
            .field("done", &self.is_done())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_subscriber_ids_are_unique() {
        let a = Subscriber::new(1, OverflowPolicy::Block);
        let b = Subscriber::new(1, OverflowPolicy::Block);
        assert!(!a.id().is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_add_and_remove_topic() {
        let sub = Subscriber::new(0, OverflowPolicy::Block);
        sub.add_topic("a");
        sub.add_topic("a");
        sub.add_topic("b");
        assert_eq!(sub.topics().len(), 2);

        sub.remove_topic("a");
        sub.remove_topic("missing");
        assert_eq!(sub.topics(), HashSet::from(["b".to_string()]));
    }

    #[test]
    fn test_done_is_idempotent() {
        let sub = Subscriber::new(1, OverflowPolicy::Block);
        assert!(!sub.is_done());
        sub.done();
        sub.done();
        assert!(sub.is_done());
    }

    #[tokio::test]
    async fn test_receive_after_done_drops_without_blocking() {
        let sub = Subscriber::new(0, OverflowPolicy::Block);
        sub.done();
        let msg = Message::new("t", "late").unwrap();
        let outcome = timeout(Duration::from_millis(100), sub.receive(msg)).await;
        assert_eq!(outcome, Ok(Delivery::Dropped));
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_listen_drains_then_returns_after_done() {
        let sub = Subscriber::new(2, OverflowPolicy::Block);
        sub.receive(Message::new("t", "m1").unwrap()).await;
        sub.receive(Message::new("t", "m2").unwrap()).await;
        sub.done();

        let mut seen = Vec::new();
        timeout(
            Duration::from_secs(1),
            sub.listen_with(|m| seen.push(m.body_as_str().into_owned())),
        )
        .await
        .expect("listen should return once the mailbox is closed");
        assert_eq!(seen, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_done_unblocks_parked_receive() {
        let sub = Subscriber::new(0, OverflowPolicy::Block);
        let msg = Message::new("t", "x").unwrap();
        let (outcome, ()) = tokio::join!(sub.receive(msg), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sub.done();
        });
        assert_eq!(outcome, Delivery::Dropped);
    }
}
