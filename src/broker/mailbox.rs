//! Bounded subscriber mailbox
//!
//! Messages travel over an unbounded `mpsc` channel; the bound is enforced by
//! a semaphore whose permits are free mailbox slots. A delivering task takes a
//! permit before it may enqueue and forgets it once the message is in the
//! queue; the consumer hands the slot back after each pop.
//!
//! Capacity 0 is a synchronous hand-off: the semaphore starts empty and a
//! waiting consumer grants exactly one permit, so a delivery only lands when
//! somebody is ready to take it.
//!
//! Closing the mailbox closes the semaphore (parked deliveries wake up and
//! drop their message) and drops the sending half, after which the consumer
//! drains whatever was already queued and then sees the end of the stream.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard, Semaphore, mpsc};

use crate::broker::message::Message;
use crate::config::OverflowPolicy;

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was placed in the mailbox.
    Delivered,
    /// The message was discarded: the mailbox is closed, or full under
    /// [`OverflowPolicy::Drop`].
    Dropped,
}

struct Inbox {
    rx: mpsc::UnboundedReceiver<Message>,
    // capacity 0 only: a hand-off permit is outstanding for this consumer
    granted: bool,
}

// A pop in progress. If it is cancelled while its hand-off permit is still
// unclaimed, the permit is taken back so no later delivery lands unattended.
struct PendingPop<'a> {
    slots: &'a Semaphore,
    inbox: AsyncMutexGuard<'a, Inbox>,
    waiting: bool,
}

impl Drop for PendingPop<'_> {
    fn drop(&mut self) {
        if !self.waiting || !self.inbox.granted {
            return;
        }
        // a failed try_acquire means a sender holds the permit and its
        // message is on the way; the grant stays for the next pop
        if let Ok(permit) = self.slots.try_acquire() {
            permit.forget();
            self.inbox.granted = false;
        }
    }
}

pub(crate) struct Mailbox {
    capacity: usize,
    slots: Semaphore,
    tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    inbox: AsyncMutex<Inbox>,
}

impl Mailbox {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            capacity,
            slots: Semaphore::new(capacity),
            tx: Mutex::new(Some(tx)),
            inbox: AsyncMutex::new(Inbox { rx, granted: false }),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) async fn push(&self, msg: Message, overflow: OverflowPolicy) -> Delivery {
        let permit = match overflow {
            OverflowPolicy::Block => match self.slots.acquire().await {
                Ok(permit) => permit,
                Err(_) => return Delivery::Dropped,
            },
            OverflowPolicy::Drop => match self.slots.try_acquire() {
                Ok(permit) => permit,
                Err(_) => return Delivery::Dropped,
            },
        };

        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) if tx.send(msg).is_ok() => {
                permit.forget();
                Delivery::Delivered
            }
            _ => Delivery::Dropped,
        }
    }

    /// Wait for the next message. `None` once the mailbox is closed and drained.
    pub(crate) async fn pop(&self) -> Option<Message> {
        let mut pending = PendingPop {
            slots: &self.slots,
            inbox: self.inbox.lock().await,
            waiting: self.capacity == 0,
        };
        if self.capacity == 0 && !pending.inbox.granted {
            self.slots.add_permits(1);
            pending.inbox.granted = true;
        }

        let msg = pending.inbox.rx.recv().await;
        pending.waiting = false;
        if msg.is_some() {
            if self.capacity == 0 {
                pending.inbox.granted = false;
            } else {
                self.slots.add_permits(1);
            }
        }
        msg
    }

    pub(crate) fn close(&self) {
        self.slots.close();
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
