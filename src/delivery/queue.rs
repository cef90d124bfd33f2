//! Bounded drop-oldest queue between producers and the delivery worker.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::warn;
use parking_lot::{Condvar, Mutex};

use crate::{encoder::Payload, error::Cancelled, rate_limited_warner::RateLimitedWarner};

use super::shutdown::ShutdownSignal;

/// Outcome of [`DeliveryQueue::enqueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The payload was appended without displacing anything.
    Accepted,
    /// The queue was full; its oldest payload was discarded.
    EvictedOldest,
}

/// Fixed-capacity FIFO of encoded payloads.
///
/// Producers never block: when the queue is full the head is discarded and
/// the new payload appended under a single lock acquisition. The worker blocks
/// in [`dequeue`](Self::dequeue) until a payload arrives or its shutdown
/// signal fires.
pub struct DeliveryQueue {
    items: Mutex<VecDeque<Payload>>,
    available: Condvar,
    capacity: usize,
    dropped: AtomicU64,
    warner: RateLimitedWarner,
}

impl DeliveryQueue {
    /// Create a queue holding at most `capacity` payloads.
    ///
    /// A zero capacity is treated as one so that the newest payload is always
    /// retained.
    pub fn new(capacity: usize, warn_interval: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            available: Condvar::new(),
            capacity,
            dropped: AtomicU64::new(0),
            warner: RateLimitedWarner::new(warn_interval),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Total payloads discarded by the drop-oldest policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Append `payload`, evicting the oldest entry if the queue is full.
    pub fn enqueue(&self, payload: Payload) -> Admission {
        let evicted = {
            let mut items = self.items.lock();
            let evicted = if items.len() >= self.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(payload);
            self.available.notify_one();
            evicted
        };
        match evicted {
            Some(_) => {
                self.record_drop();
                Admission::EvictedOldest
            }
            None => Admission::Accepted,
        }
    }

    /// Return a payload to the head of the queue.
    ///
    /// Used when the worker stops while holding an undelivered payload. If
    /// producers refilled the queue in the meantime the payload is the oldest
    /// entry and is dropped instead.
    pub fn requeue_front(&self, payload: Payload) -> Admission {
        {
            let mut items = self.items.lock();
            if items.len() < self.capacity {
                items.push_front(payload);
                self.available.notify_one();
                return Admission::Accepted;
            }
        }
        self.record_drop();
        Admission::EvictedOldest
    }

    /// Remove the oldest payload, blocking until one is available.
    ///
    /// Returns [`Cancelled`] once `shutdown` has been triggered and
    /// [`interrupt`](Self::interrupt) called, leaving queued payloads intact.
    pub fn dequeue(&self, shutdown: &ShutdownSignal) -> Result<Payload, Cancelled> {
        let mut items = self.items.lock();
        loop {
            shutdown.check()?;
            if let Some(payload) = items.pop_front() {
                return Ok(payload);
            }
            self.available.wait(&mut items);
        }
    }

    /// Remove the oldest payload without blocking.
    pub fn try_dequeue(&self) -> Option<Payload> {
        self.items.lock().pop_front()
    }

    /// Wake every blocked [`dequeue`](Self::dequeue) so it re-checks its
    /// shutdown signal.
    pub fn interrupt(&self) {
        let _items = self.items.lock();
        self.available.notify_all();
    }

    /// Copy of the pending payloads, oldest first.
    pub fn snapshot(&self) -> Vec<Payload> {
        self.items.lock().iter().cloned().collect()
    }

    /// Emit any pending drop summary immediately.
    pub fn flush_warnings(&self) {
        self.warner.flush(|count| {
            warn!("femtoship: {count} log lines dropped because the delivery queue was full");
        });
    }

    fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("femtoship: {count} log lines dropped because the delivery queue was full");
        });
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}
