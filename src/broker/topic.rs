//! Topic management
//!
//! A `Topic` holds the set of subscriber IDs for a particular topic name.
//! Subscriptions are stored as a `HashSet` of `SubscriberId` and duplicate
//! subscriptions are a no-op. Topics are never deleted: once the last
//! subscriber leaves, the topic simply stays around with an empty set.
//!
//! Concurrency note: `Topic` has no lock of its own; the broker registry lock
//! guards every access.

use std::collections::HashSet;

pub type SubscriberId = String;

#[derive(Debug, Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: HashSet<SubscriberId>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Add a subscriber to the topic. Duplicate adds are ignored.
    pub fn subscribe(&mut self, id: SubscriberId) {
        self.subscribers.insert(id);
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&mut self, id: &str) {
        self.subscribers.remove(id);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
