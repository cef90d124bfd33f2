//! Debug side channel for internal delivery events.
//!
//! Messages are forwarded to the `log` facade under the [`DIAGNOSTICS_TARGET`]
//! target only when the debug flag is set. Nothing here can fail or block on
//! the network.

use log::debug;

/// Log target used for every diagnostic record.
pub const DIAGNOSTICS_TARGET: &str = "femtoship";
/// Prefix identifying shipper messages in the host's log output.
const SIGNATURE: &str = "LE: ";

/// Emits debug messages when enabled; a no-op otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Report `message` if debugging is enabled.
    pub fn debug(&self, message: impl std::fmt::Display) {
        if self.enabled {
            debug!(target: DIAGNOSTICS_TARGET, "{SIGNATURE}{message}");
        }
    }

    /// Report a message built lazily, skipping the formatting when disabled.
    pub fn debug_with<M: std::fmt::Display>(&self, message: impl FnOnce() -> M) {
        if self.enabled {
            debug!(target: DIAGNOSTICS_TARGET, "{SIGNATURE}{}", message());
        }
    }
}
