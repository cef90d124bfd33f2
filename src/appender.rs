//! Producer-facing appender.
//!
//! [`FemtoShipper`] accepts rendered log lines, encodes them with the
//! delivery token and hands them to the delivery queue. The worker thread is
//! started on the first accepted line. Nothing here blocks on the network or
//! reports errors to the caller.

use std::{borrow::Cow, sync::Arc, time::Duration};

use log::warn;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::{
    credentials::{AppSettings, Token, resolve_token},
    delivery::{
        Admission, BackoffState, DeliveryQueue, ShipperConfig, TcpTransport, Transport,
        WorkerHandle, spawn_worker,
    },
    diagnostics::Diagnostics,
    encoder::encode,
    error::{ConfigError, CredentialError},
    rate_limited_warner::RateLimitedWarner,
};

/// How long [`FemtoShipper::close`] waits for the worker to exit.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Replacement for embedded newlines so each record stays on one line.
pub const LINE_SEPARATOR: char = '\u{2028}';

const INVALID_TOKEN: &str =
    "It appears your LOGENTRIES_TOKEN setting is invalid, log lines will not be delivered";

/// Trim trailing newlines and replace embedded ones with [`LINE_SEPARATOR`].
pub fn sanitise_line(rendered: &str) -> Cow<'_, str> {
    let trimmed = rendered.trim_end_matches('\n');
    if trimmed.contains('\n') {
        Cow::Owned(trimmed.replace('\n', &LINE_SEPARATOR.to_string()))
    } else {
        Cow::Borrowed(trimmed)
    }
}

/// Appender shipping rendered lines to the ingestion endpoint.
pub struct FemtoShipper<T: Transport + Clone = TcpTransport> {
    credential: Result<Token, CredentialError>,
    config: ShipperConfig,
    transport: T,
    queue: Arc<DeliveryQueue>,
    worker: OnceCell<WorkerHandle>,
    /// Set by `close`; worker start happens under this lock.
    closed: Mutex<bool>,
    diagnostics: Diagnostics,
    refused: RateLimitedWarner,
}

impl FemtoShipper<TcpTransport> {
    /// Build an appender from application settings.
    ///
    /// Configuration errors are returned. An invalid token is not: the
    /// appender is still built and refuses every line.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ConfigError> {
        let config = ShipperConfig::from_settings(settings)?;
        Self::new(config, resolve_token(settings))
    }

    /// Build an appender targeting the endpoint named in `config`.
    pub fn new(
        config: ShipperConfig,
        credential: Result<Token, CredentialError>,
    ) -> Result<Self, ConfigError> {
        let transport = config.transport();
        Self::with_transport(config, credential, transport)
    }
}

impl<T: Transport + Clone> FemtoShipper<T> {
    /// Build an appender delivering through a custom transport.
    pub fn with_transport(
        config: ShipperConfig,
        credential: Result<Token, CredentialError>,
        transport: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let diagnostics = Diagnostics::new(config.debug);
        if let Err(err) = &credential {
            diagnostics.debug_with(|| format!("{INVALID_TOKEN}: {err}"));
        }
        Ok(Self {
            queue: Arc::new(DeliveryQueue::new(config.capacity, config.warn_interval)),
            refused: RateLimitedWarner::new(config.warn_interval),
            credential,
            transport,
            worker: OnceCell::new(),
            closed: Mutex::new(false),
            diagnostics,
            config,
        })
    }

    /// Queue one rendered line for delivery.
    pub fn append(&self, rendered: &str) {
        let token = match &self.credential {
            Ok(token) => token,
            Err(err) => {
                self.refuse(err);
                return;
            }
        };
        self.ensure_started();
        let line = sanitise_line(rendered);
        self.diagnostics.debug_with(|| format!("Queueing {line}"));
        if self.queue.enqueue(encode(token.as_str(), &line)) == Admission::EvictedOldest {
            self.diagnostics
                .debug("Queue full, dropped the oldest pending line");
        }
    }

    /// Queue several lines in order.
    pub fn append_all<'a>(&self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.append(line);
        }
    }

    /// Stop the worker, waiting up to [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub fn close(&self) -> bool {
        self.close_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Stop the worker, waiting up to `timeout` for it to exit.
    ///
    /// Lines still queued are not delivered. Lines appended afterwards are
    /// queued but no new worker is started.
    pub fn close_with_timeout(&self, timeout: Duration) -> bool {
        *self.closed.lock() = true;
        self.queue.flush_warnings();
        self.refused.flush(|count| {
            warn!("femtoship: {count} log lines refused because the delivery token is invalid");
        });
        match self.worker.get() {
            Some(worker) => {
                self.diagnostics.debug("Shutting down delivery worker");
                worker.stop(timeout)
            }
            None => true,
        }
    }

    pub fn is_started(&self) -> bool {
        self.worker.get().is_some()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    pub fn credential(&self) -> Result<&Token, &CredentialError> {
        self.credential.as_ref()
    }

    pub fn config(&self) -> &ShipperConfig {
        &self.config
    }

    /// Shared delivery queue, for observability.
    pub fn queue(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    fn ensure_started(&self) {
        if self.worker.get().is_some() {
            return;
        }
        // Held across the start so `close` either sees the worker or blocks it.
        let closed = self.closed.lock();
        if *closed {
            return;
        }
        let started = self.worker.get_or_try_init(|| {
            self.diagnostics
                .debug("Starting Logentries asynchronous socket client");
            spawn_worker(
                Arc::clone(&self.queue),
                self.transport.clone(),
                BackoffState::new(self.config.backoff),
                self.diagnostics,
            )
        });
        if let Err(err) = started {
            warn!("femtoship: failed to start delivery worker: {err}");
        }
    }

    fn refuse(&self, err: &CredentialError) {
        self.diagnostics.debug_with(|| format!("{INVALID_TOKEN}: {err}"));
        self.refused.record_drop();
        self.refused.warn_if_due(|count| {
            warn!("femtoship: {count} log lines refused: {err}");
        });
    }
}

impl<T: Transport + Clone> Drop for FemtoShipper<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport + Clone> std::fmt::Debug for FemtoShipper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FemtoShipper")
            .field("transport", &self.transport.to_string())
            .field("queue", &self.queue)
            .field("started", &self.is_started())
            .finish()
    }
}
