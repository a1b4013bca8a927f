//! Core functionality for the FieldLink telemetry node.
//!
//! This crate provides the shared pieces both reporting loops are built on:
//! the telemetry frame model, the bounded-retry delivery channel, the
//! injectable clock, worker spawning, configuration and logging.

pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod frame;
pub mod logging;
pub mod worker;

pub use clock::{Clock, RecordingClock, StopSignal, SystemClock, Wake};
pub use config::{Config, DeliveryConfig, LocationConfig, LogFormat, LoggingConfig, SamplingConfig};
pub use delivery::{DeliveryChannel, DeliveryOutcome, DeliveryReport, Transport};
pub use error::{ConfigError, CoreError, Result};
pub use frame::{Channel, ChannelValue, TelemetryFrame};
pub use worker::spawn_worker;
