//! Cancellation signal shared between a worker and its owner.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::error::Cancelled;

#[derive(Default)]
struct Inner {
    triggered: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// One-shot stop request observed by the delivery worker.
///
/// Clones share the same state. Once triggered the signal stays triggered.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake any interruptible sleep.
    pub fn trigger(&self) {
        let _guard = self.inner.lock.lock();
        self.inner.triggered.store(true, Ordering::Release);
        self.inner.wake.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Fail with [`Cancelled`] if shutdown has been requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_triggered() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// A `duration` too large to express as a deadline sleeps until shutdown.
    pub fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        let deadline = Instant::now().checked_add(duration);
        let mut guard = self.inner.lock.lock();
        loop {
            self.check()?;
            match deadline {
                Some(deadline) => {
                    if self
                        .inner
                        .wake
                        .wait_until(&mut guard, deadline)
                        .timed_out()
                    {
                        return self.check();
                    }
                }
                None => self.inner.wake.wait(&mut guard),
            }
        }
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
