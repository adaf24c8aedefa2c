//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - the registry of subscribers it has minted
//! - the topic -> subscriber-id index, created lazily on first subscription
//! - fanning published messages out to a snapshot of a topic's members
//!
//! Concurrency and usage notes:
//! - One `RwLock` guards the subscriber table and the topic index together.
//!   Every mutation takes it exclusively; only `publish` and the read-only
//!   queries take it shared. A subscriber's own topic lock is always taken
//!   after the registry lock, never before.
//! - `publish` copies the member list and releases the lock before spawning
//!   one delivery task per member. It returns without waiting for any
//!   delivery. Tasks go to the runtime the broker was built in, or the
//!   caller's runtime; with neither, each delivery gets its own thread.
//! - Deliveries are independent tasks: no ordering across them, no retries.
//!   Their progress is visible through [`Broker::stats`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::broker::mailbox::Delivery;
use crate::broker::message::Message;
use crate::broker::stats::{DeliverySnapshot, DeliveryStats};
use crate::broker::subscriber::Subscriber;
use crate::broker::topic::{SubscriberId, Topic};
use crate::config::BrokerSettings;
use crate::utils::error::BrokerError;

#[derive(Debug, Default)]
struct Registry {
    subscribers: HashMap<SubscriberId, Arc<Subscriber>>,
    topics: HashMap<String, Topic>,
}

#[derive(Debug)]
pub struct Broker {
    registry: RwLock<Registry>,
    settings: BrokerSettings,
    stats: Arc<DeliveryStats>,
    runtime: Option<Handle>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::with_settings(BrokerSettings::default())
    }
}

impl Broker {
    /// Create an empty broker with default settings.
    ///
    /// When called inside a tokio runtime, deliveries are spawned onto that
    /// runtime for the lifetime of the broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty broker whose subscribers use `settings.overflow`
    /// when their mailbox is full.
    pub fn with_settings(settings: BrokerSettings) -> Self {
        Self {
            registry: RwLock::default(),
            settings,
            stats: Arc::default(),
            runtime: Handle::try_current().ok(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a new subscriber and register it. Negative capacities become 0.
    pub fn add_subscriber(&self, capacity: i64) -> Arc<Subscriber> {
        let capacity = usize::try_from(capacity.max(0)).unwrap_or(usize::MAX);
        let subscriber = Arc::new(Subscriber::new(capacity, self.settings.overflow));

        self.write()
            .subscribers
            .insert(subscriber.id().to_string(), Arc::clone(&subscriber));
        info!(subscriber = subscriber.id(), capacity, "subscriber added");
        subscriber
    }

    /// Subscribes a subscriber to a topic. Automatically creates the topic if it doesn't exist.
    ///
    /// Subscribing twice is a no-op. Subscribers that were never registered
    /// here, or were already removed, are ignored.
    pub fn subscribe(&self, subscriber: &Subscriber, topic: &str) {
        let mut registry = self.write();
        if !registry.subscribers.contains_key(subscriber.id()) {
            warn!(
                subscriber = subscriber.id(),
                topic, "subscribe ignored, subscriber not registered"
            );
            return;
        }

        registry
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(subscriber.id().to_string());
        subscriber.add_topic(topic);
        info!(subscriber = subscriber.id(), topic, "subscribed");
    }

    /// Unsubscribes a subscriber from a topic.
    /// Unknown topics and non-members are left untouched.
    pub fn unsubscribe(&self, subscriber: &Subscriber, topic: &str) {
        let mut registry = self.write();
        Self::detach(&mut registry, subscriber, topic);
        info!(subscriber = subscriber.id(), topic, "unsubscribed");
    }

    fn detach(registry: &mut Registry, subscriber: &Subscriber, topic: &str) {
        if let Some(t) = registry.topics.get_mut(topic) {
            t.unsubscribe(subscriber.id());
            if t.is_empty() {
                debug!(topic = %t.name, "topic has no subscribers left");
            }
        }
        subscriber.remove_topic(topic);
    }

    /// Number of subscribers currently on `topic`; 0 for unknown topics.
    pub fn topic_subscriber_count(&self, topic: &str) -> usize {
        self.read().topics.get(topic).map_or(0, Topic::len)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.read().subscribers.len()
    }

    /// Whether `id` names a subscriber that is registered and not yet removed.
    pub fn contains_subscriber(&self, id: &str) -> bool {
        self.read().subscribers.contains_key(id)
    }

    /// Removes the subscriber from every topic and from the registry, then
    /// marks it done.
    ///
    /// Teardown happens under a single registry write lock, so no concurrent
    /// `subscribe` can slip in between the topic snapshot and the removal.
    /// Deliveries already dispatched to it are dropped rather than left parked.
    pub fn remove_subscriber(&self, subscriber: &Subscriber) {
        {
            let mut registry = self.write();
            for topic in subscriber.topics() {
                Self::detach(&mut registry, subscriber, &topic);
                debug!(subscriber = subscriber.id(), topic = %topic, "unsubscribed on removal");
            }
            registry.subscribers.remove(subscriber.id());
        }

        subscriber.done();
        info!(subscriber = subscriber.id(), "subscriber removed");
    }

    /// Publishes `body` to every current subscriber of `topic`.
    ///
    /// Fails with [`BrokerError::InvalidTopic`] for an empty topic, in which
    /// case nobody is contacted. Publishing to a topic without subscribers
    /// succeeds and the message is discarded.
    pub fn publish(&self, topic: &str, body: impl Into<Bytes>) -> Result<(), BrokerError> {
        let msg = Message::new(topic, body)?;

        let targets: Vec<Arc<Subscriber>> = {
            let registry = self.read();
            registry
                .topics
                .get(topic)
                .map(|t| {
                    t.subscribers
                        .iter()
                        .filter_map(|id| registry.subscribers.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };

        self.stats.record_publish();
        debug!(topic, subscribers = targets.len(), "publishing message");

        for subscriber in targets {
            self.dispatch(subscriber, msg.clone());
        }
        Ok(())
    }

    fn dispatch(&self, subscriber: Arc<Subscriber>, msg: Message) {
        let stats = Arc::clone(&self.stats);
        stats.begin();

        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        match runtime {
            Some(handle) => {
                handle.spawn(async move {
                    let outcome = subscriber.receive(msg).await;
                    stats.finish(outcome);
                });
            }
            None => {
                // tokio's sync primitives need no reactor, so a plain executor
                // on a dedicated thread can drive the delivery
                let thread_stats = Arc::clone(&stats);
                let spawned = std::thread::Builder::new()
                    .name("pubhub-delivery".into())
                    .spawn(move || {
                        let outcome = futures::executor::block_on(subscriber.receive(msg));
                        thread_stats.finish(outcome);
                    });
                if let Err(e) = spawned {
                    warn!(error = %e, "failed to start delivery thread, message dropped");
                    stats.finish(Delivery::Dropped);
                }
            }
        }
    }

    /// Delivery counters accumulated since the broker was created.
    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }
}
