//! Error types shared across the crate.

use std::io;

use thiserror::Error;

/// Failure to establish a connection to the ingestion endpoint.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("unable to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("TLS handshake with {domain} failed: {source}")]
    Tls {
        domain: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to configure socket: {0}")]
    Socket(#[source] io::Error),
}

/// The worker was asked to stop while blocked.
#[derive(Clone, Copy, Debug, Default, Error, PartialEq, Eq)]
#[error("delivery worker cancelled")]
pub struct Cancelled;

/// The delivery token could not be resolved.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("{key} is not a valid GUID: {value:?}")]
    Malformed { key: &'static str, value: String },
}

/// Errors that may occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid shipper configuration: {0}")]
    InvalidConfig(String),
    /// Settings file could not be read or parsed.
    #[error("failed to load settings from {path}: {source}")]
    Settings {
        path: String,
        #[source]
        source: ini::Error,
    },
}
