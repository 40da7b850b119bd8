//! Buffered, interval-flushed telemetry shipper for InfluxDB v2.
//!
//! Producers hand severity-tagged log records to a [`Shipper`]; records
//! that pass the per-module level filter accumulate in a shared queue and
//! are shipped as batched line-protocol points on a recurring timer, on
//! demand, or during the final shutdown drain. Delivery is at-most-once:
//! a batch that fails to ship is logged and discarded, never retried.

pub mod config;
pub mod encode;
pub mod filter;
pub mod queue;
pub mod record;
pub mod shipper;
pub mod sink;

pub use config::{ConfigError, LevelsConfig, ModuleLevel, ShipperConfig};
pub use filter::LevelFilter;
pub use record::{Bindings, Record, Severity};
pub use shipper::{Shipper, ShipperState};
pub use sink::{PointSink, WriteError};
