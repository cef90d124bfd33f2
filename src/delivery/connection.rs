//! Ownership of the single outbound connection.
//!
//! [`ConnectionManager`] lives on the delivery worker thread and is the only
//! code that touches the socket or the backoff state.

use std::io::{self, Write};

use crate::{
    diagnostics::Diagnostics,
    encoder::Payload,
    error::{Cancelled, ConnectionError},
};

use super::{
    backoff::BackoffState,
    shutdown::ShutdownSignal,
    transport::{OutboundStream, Transport},
};

/// Lifecycle of the managed connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Opens, closes and re-establishes the connection to the endpoint.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    state: ConnectionState,
    backoff: BackoffState,
    stream: Option<T::Stream>,
    diagnostics: Diagnostics,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, backoff: BackoffState, diagnostics: Diagnostics) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            backoff,
            stream: None,
            diagnostics,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn backoff(&self) -> &BackoffState {
        &self.backoff
    }

    /// Establish a fresh connection, replacing any existing one.
    pub fn open(&mut self) -> Result<(), ConnectionError> {
        self.close();
        self.state = ConnectionState::Connecting;
        self.diagnostics
            .debug_with(|| format!("Connecting to {}", self.transport));
        match self.transport.open() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(err) => {
                self.state = ConnectionState::Failed;
                Err(err)
            }
        }
    }

    /// Release the current connection. Safe to call when already closed.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            self.diagnostics.debug("Connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Close, then retry [`open`](Self::open) until it succeeds.
    ///
    /// Failed attempts sleep `current + rand(0, current)` before the next try,
    /// doubling `current` up to the policy cap. The delay restarts at the
    /// policy minimum on every call and again once connected. Only `shutdown`
    /// ends the loop early.
    pub fn reconnect(&mut self, shutdown: &ShutdownSignal) -> Result<(), Cancelled> {
        self.close();
        self.backoff.reset();
        loop {
            shutdown.check()?;
            match self.open() {
                Ok(()) => {
                    self.backoff.reset();
                    self.diagnostics
                        .debug_with(|| format!("Connected to {}", self.transport));
                    return Ok(());
                }
                Err(err) => {
                    self.diagnostics
                        .debug_with(|| format!("Unable to connect to Logentries: {err}"));
                }
            }
            shutdown.check()?;
            let delay = self.backoff.next_sleep();
            self.diagnostics
                .debug_with(|| format!("Retrying connection in {delay:?}"));
            shutdown.sleep(delay)?;
        }
    }

    /// Write the payload and flush.
    pub fn write(&mut self, payload: &Payload) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no active connection",
            ));
        };
        let result = stream
            .write_all(payload.as_bytes())
            .and_then(|()| stream.flush());
        if result.is_err() {
            self.state = ConnectionState::Failed;
        }
        result
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        self.close();
    }
}
