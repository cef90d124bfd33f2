//! Worker thread draining the delivery queue into the connection.
//!
//! The worker connects through [`ConnectionManager::reconnect`] before its
//! first dequeue, then writes payloads one at a time. A failed write triggers
//! a reconnect and the same payload is written again before anything newer.
//! Shutdown interrupts both the blocking dequeue and the reconnect sleep;
//! undelivered payloads stay in the queue.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::warn;
use parking_lot::Mutex;

use crate::{diagnostics::Diagnostics, encoder::Payload, error::Cancelled};

use super::{
    backoff::BackoffState, connection::ConnectionManager, queue::DeliveryQueue,
    shutdown::ShutdownSignal, transport::Transport,
};

/// Name given to the delivery thread.
pub const WORKER_THREAD_NAME: &str = "femtoship-delivery";

/// Handle to a running delivery worker.
pub struct WorkerHandle {
    shutdown: ShutdownSignal,
    queue: Arc<DeliveryQueue>,
    handle: Mutex<Option<JoinHandle<()>>>,
    done_rx: Receiver<()>,
    detached: AtomicBool,
}

/// Start the delivery worker on a dedicated thread.
pub fn spawn_worker<T: Transport>(
    queue: Arc<DeliveryQueue>,
    transport: T,
    backoff: BackoffState,
    diagnostics: Diagnostics,
) -> io::Result<WorkerHandle> {
    let shutdown = ShutdownSignal::new();
    let (done_tx, done_rx) = bounded(1);
    let handle = {
        let queue = Arc::clone(&queue);
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || {
                let manager = ConnectionManager::new(transport, backoff, diagnostics);
                worker_main(&queue, manager, &shutdown, diagnostics, done_tx);
            })?
    };
    Ok(WorkerHandle {
        shutdown,
        queue,
        handle: Mutex::new(Some(handle)),
        done_rx,
        detached: AtomicBool::new(false),
    })
}

fn worker_main<T: Transport>(
    queue: &DeliveryQueue,
    mut manager: ConnectionManager<T>,
    shutdown: &ShutdownSignal,
    diagnostics: Diagnostics,
    done_tx: Sender<()>,
) {
    if let Err(Cancelled) = drain(queue, &mut manager, shutdown, diagnostics) {
        diagnostics.debug("Logentries asynchronous socket client interrupted");
    }
    manager.close();
    let _ = done_tx.send(());
}

fn drain<T: Transport>(
    queue: &DeliveryQueue,
    manager: &mut ConnectionManager<T>,
    shutdown: &ShutdownSignal,
    diagnostics: Diagnostics,
) -> Result<(), Cancelled> {
    manager.reconnect(shutdown)?;
    loop {
        let payload = queue.dequeue(shutdown)?;
        deliver(queue, manager, shutdown, diagnostics, payload)?;
    }
}

fn deliver<T: Transport>(
    queue: &DeliveryQueue,
    manager: &mut ConnectionManager<T>,
    shutdown: &ShutdownSignal,
    diagnostics: Diagnostics,
    payload: Payload,
) -> Result<(), Cancelled> {
    loop {
        let Err(err) = manager.write(&payload) else {
            return Ok(());
        };
        diagnostics.debug_with(|| format!("Write failed, reconnecting: {err}"));
        if let Err(cancelled) = manager.reconnect(shutdown) {
            queue.requeue_front(payload);
            return Err(cancelled);
        }
    }
}

impl WorkerHandle {
    /// Whether the worker has not yet been asked to stop.
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_triggered()
    }

    /// Ask the worker to stop and wait up to `timeout` for it to exit.
    ///
    /// Returns `false` if the worker did not finish in time; the thread is
    /// then detached and later calls keep returning `false` without waiting.
    /// After a clean stop, later calls return `true`.
    pub fn stop(&self, timeout: Duration) -> bool {
        self.shutdown.trigger();
        self.queue.interrupt();
        // Held until the outcome is known so concurrent callers agree on it.
        let mut slot = self.handle.lock();
        let Some(handle) = slot.take() else {
            return !self.detached.load(Ordering::Acquire);
        };
        if self.done_rx.recv_timeout(timeout).is_err() {
            self.detached.store(true, Ordering::Release);
            warn!("femtoship: delivery worker did not shut down within {timeout:?}");
            return false;
        }
        if handle.join().is_err() {
            warn!("femtoship: delivery worker panicked");
        }
        true
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("shutdown", &self.shutdown)
            .finish()
    }
}
