//! Log shipping to a Logentries-style token endpoint.
//!
//! Rendered lines are prefixed with a delivery token and queued without
//! blocking the caller. A background worker owns the TCP connection and
//! forwards queued lines in order, reconnecting with exponential backoff when
//! the network fails. Under sustained outage the oldest queued lines are
//! discarded so memory stays bounded.

pub mod appender;
pub mod credentials;
pub mod delivery;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod log_compat;
pub mod rate_limited_warner;

pub use appender::{FemtoShipper, LINE_SEPARATOR, sanitise_line};
pub use credentials::{AppSettings, Token, resolve_token};
pub use delivery::{
    Admission, BackoffPolicy, BackoffState, ConnectionManager, ConnectionState, DeliveryQueue,
    Endpoint, OutboundStream, ShipperConfig, ShutdownSignal, TcpTransport, TlsOptions, Transport,
    WorkerHandle, spawn_worker,
};
pub use diagnostics::Diagnostics;
pub use encoder::{Payload, encode};
pub use error::{Cancelled, ConfigError, ConnectionError, CredentialError};
pub use log_compat::ShipperLogAdapter;
