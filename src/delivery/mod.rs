//! Asynchronous delivery pipeline.
//!
//! Producers push encoded [`Payload`](crate::encoder::Payload) values into a
//! bounded [`DeliveryQueue`] that evicts its oldest entry when full. A single
//! worker thread drains the queue through a [`ConnectionManager`], which owns
//! the outbound socket and re-establishes it with jittered exponential
//! backoff whenever a connect or write fails.

mod backoff;
mod config;
mod connection;
mod queue;
mod shutdown;
mod transport;
mod worker;


pub use backoff::BackoffState;
pub use config::{
    BackoffPolicy, DEFAULT_CONNECT_TIMEOUT, DEFAULT_QUEUE_CAPACITY, DEFAULT_WRITE_TIMEOUT,
    Endpoint, LE_API_HOST, LE_PORT, LE_TLS_PORT, MAX_DELAY, MAX_DELAY_CEILING, MIN_DELAY,
    MIN_DELAY_FLOOR, ShipperConfig,
};
pub use connection::{ConnectionManager, ConnectionState};
pub use queue::{Admission, DeliveryQueue};
pub use shutdown::ShutdownSignal;
pub use transport::{ActiveConnection, OutboundStream, TcpTransport, TlsOptions, Transport};
pub use worker::{WORKER_THREAD_NAME, WorkerHandle, spawn_worker};
