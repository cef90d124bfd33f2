#![allow(dead_code)]

pub mod collector;
pub mod fixtures;

pub use collector::Collector;
pub use fixtures::{GUID, fast_config, shipper_for};
