//! Delivery counters
//!
//! Every delivery task is counted from dispatch to completion, so a delivery
//! parked on a full mailbox stays visible in `in_flight` rather than hiding in
//! a detached task.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::broker::mailbox::Delivery;

#[derive(Debug, Default)]
pub struct DeliveryStats {
    published: AtomicU64,
    in_flight: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySnapshot {
    /// Successful `publish` calls.
    pub published: u64,
    /// Delivery tasks dispatched but not yet finished.
    pub in_flight: u64,
    pub delivered: u64,
    pub dropped: u64,
}

impl DeliveryStats {
    pub(crate) fn record_publish(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn begin(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn finish(&self, outcome: Delivery) {
        match outcome {
            Delivery::Delivered => self.delivered.fetch_add(1, Ordering::AcqRel),
            Delivery::Dropped => self.dropped.fetch_add(1, Ordering::AcqRel),
        };
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            published: self.published.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            delivered: self.delivered.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Acquire),
        }
    }
}
