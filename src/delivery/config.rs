//! Configuration structures consumed by the delivery pipeline.
//!
//! [`ShipperConfig`] is assembled before the worker starts, either through the
//! `with_*` methods or from [`AppSettings`](crate::credentials::AppSettings),
//! and is then moved into the worker thread.

use std::time::Duration;

use crate::{
    credentials::{AppSettings, DEBUG_KEY, TLS_KEY},
    error::ConfigError,
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
};

use super::transport::{TcpTransport, TlsOptions};

/// Default number of payloads buffered before the oldest is evicted.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32768;
/// Default connection timeout applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default write timeout applied to socket writes.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Minimal delay between reconnection attempts.
pub const MIN_DELAY: Duration = Duration::from_millis(100);
/// Maximal deterministic delay between reconnection attempts.
pub const MAX_DELAY: Duration = Duration::from_secs(10);
/// Smallest backoff minimum accepted by [`ShipperConfig::validate`].
pub const MIN_DELAY_FLOOR: Duration = Duration::from_millis(1);
/// Largest backoff maximum accepted by [`ShipperConfig::validate`].
pub const MAX_DELAY_CEILING: Duration = Duration::from_secs(3600);

/// Logentries ingestion host.
pub const LE_API_HOST: &str = "api.logentries.com";
/// Port for plain-text token logging.
pub const LE_PORT: u16 = 10000;
/// Port for TLS token logging.
pub const LE_TLS_PORT: u16 = 20000;

/// Remote ingestion endpoint selected for delivery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Endpoint {
    /// Plain TCP on [`LE_PORT`].
    #[default]
    Plain,
    /// TLS over TCP on [`LE_TLS_PORT`].
    Tls,
}

impl Endpoint {
    /// Build the TCP transport for this endpoint.
    pub fn transport(self, connect_timeout: Duration, write_timeout: Duration) -> TcpTransport {
        let (port, tls) = match self {
            Endpoint::Plain => (LE_PORT, None),
            Endpoint::Tls => (
                LE_TLS_PORT,
                Some(TlsOptions {
                    domain: LE_API_HOST.into(),
                    insecure_skip_verify: false,
                }),
            ),
        };
        TcpTransport {
            host: LE_API_HOST.into(),
            port,
            tls,
            connect_timeout,
            write_timeout,
        }
    }
}

/// Configuration for a [`FemtoShipper`](crate::FemtoShipper) and its worker.
#[derive(Clone, Debug)]
pub struct ShipperConfig {
    pub capacity: usize,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    pub endpoint: Endpoint,
    pub backoff: BackoffPolicy,
    pub debug: bool,
    pub warn_interval: Duration,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            endpoint: Endpoint::default(),
            backoff: BackoffPolicy::default(),
            debug: false,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl ShipperConfig {
    /// Read the debug and TLS flags from application settings.
    ///
    /// Unset keys keep their defaults. Values other than `true`/`false`
    /// (case-insensitive) are rejected.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(debug) = settings.get_flag(DEBUG_KEY)? {
            config.debug = debug;
        }
        if let Some(true) = settings.get_flag(TLS_KEY)? {
            config.endpoint = Endpoint::Tls;
        }
        Ok(config)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warn_interval = interval;
        self
    }

    /// Reject configurations the worker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "queue capacity must be greater than zero".into(),
            ));
        }
        let BackoffPolicy { min, max } = self.backoff;
        if min < MIN_DELAY_FLOOR {
            return Err(ConfigError::InvalidConfig(format!(
                "backoff minimum must be at least {MIN_DELAY_FLOOR:?}, got {min:?}"
            )));
        }
        if min > max {
            return Err(ConfigError::InvalidConfig(format!(
                "backoff minimum {min:?} exceeds maximum {max:?}"
            )));
        }
        if max > MAX_DELAY_CEILING {
            return Err(ConfigError::InvalidConfig(format!(
                "backoff maximum must be at most {MAX_DELAY_CEILING:?}, got {max:?}"
            )));
        }
        Ok(())
    }

    /// Transport for the configured endpoint.
    pub fn transport(&self) -> TcpTransport {
        self.endpoint
            .transport(self.connect_timeout, self.write_timeout)
    }
}

/// Exponential backoff policy for reconnection attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min: MIN_DELAY,
            max: MAX_DELAY,
        }
    }
}
