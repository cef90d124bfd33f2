//! Compatibility bridge for the Rust `log` crate.
//!
//! [`ShipperLogAdapter`] implements `log::Log` by rendering each record to a
//! single line and appending it to a shared [`FemtoShipper`]. Records emitted
//! by this crate's own diagnostics are skipped so that enabling debug output
//! while the adapter is installed cannot feed back into the queue.

use std::sync::Arc;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::{
    appender::FemtoShipper,
    delivery::{TcpTransport, Transport},
    diagnostics::DIAGNOSTICS_TARGET,
};

/// Adapter implementing the Rust `log::Log` trait.
pub struct ShipperLogAdapter<T: Transport + Clone = TcpTransport> {
    shipper: Arc<FemtoShipper<T>>,
    max_level: LevelFilter,
}

/// Render a record as `LEVEL target - message`.
pub fn render_record(record: &Record<'_>) -> String {
    format!("{} {} - {}", record.level(), record.target(), record.args())
}

fn is_own_target(target: &str) -> bool {
    target == DIAGNOSTICS_TARGET
        || target
            .strip_prefix(DIAGNOSTICS_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl<T: Transport + Clone> ShipperLogAdapter<T> {
    pub fn new(shipper: Arc<FemtoShipper<T>>, max_level: LevelFilter) -> Self {
        Self { shipper, max_level }
    }

    pub fn shipper(&self) -> &Arc<FemtoShipper<T>> {
        &self.shipper
    }
}

impl<T: Transport + Clone + Sync> ShipperLogAdapter<T> {
    /// Install the adapter as the global logger.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl<T: Transport + Clone + Sync> log::Log for ShipperLogAdapter<T> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && !is_own_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.shipper.append(&render_record(record));
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("femtoship", true)]
    #[case("femtoship::delivery", true)]
    #[case("femtoshipper", false)]
    #[case("app::db", false)]
    fn own_targets_are_detected(#[case] target: &str, #[case] expected: bool) {
        assert_eq!(is_own_target(target), expected);
    }

    #[rstest]
    fn renders_level_target_and_message() {
        let record = Record::builder()
            .level(log::Level::Warn)
            .target("app::db")
            .args(format_args!("pool exhausted"))
            .build();
        assert_eq!(render_record(&record), "WARN app::db - pool exhausted");
    }
}
