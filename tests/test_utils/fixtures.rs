//! Shared constructors for shippers pointed at a local [`Collector`].

use std::time::Duration;

use femtoship::{BackoffPolicy, FemtoShipper, ShipperConfig, TcpTransport, Token};

use super::Collector;

/// Well-formed delivery token used across tests.
pub const GUID: &str = "2bfbea1e-10c3-4419-bdad-7e6435882e1f";

/// Configuration with millisecond-scale backoff so reconnect tests stay quick.
pub fn fast_config() -> ShipperConfig {
    ShipperConfig::default().with_backoff(BackoffPolicy {
        min: Duration::from_millis(5),
        max: Duration::from_millis(50),
    })
}

/// Shipper with a valid token delivering to `collector`.
pub fn shipper_for(collector: &Collector, config: ShipperConfig) -> FemtoShipper<TcpTransport> {
    let transport = TcpTransport::new(collector.host(), collector.port())
        .with_connect_timeout(Duration::from_millis(500));
    FemtoShipper::with_transport(config, Token::parse(GUID), transport).expect("valid config")
}
