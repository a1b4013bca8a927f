//! Error types for sensor access.

use crate::kind::SensorKind;
use thiserror::Error;

/// Failures reported by a device handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Bus transaction or measurement failed
    #[error("Hardware fault: {0}")]
    HardwareFault(String),

    /// Device did not answer its identification/initialization sequence
    #[error("Init fault: {0}")]
    InitFault(String),
}

/// Errors surfaced by the sensor registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Sensor is currently unplugged or unresponsive; no hardware access was made
    #[error("Sensor {kind} not available")]
    NotAvailable {
        /// Sensor kind
        kind: SensorKind,
    },

    /// Hardware read failed; the sensor has been marked unavailable
    #[error("Read fault on sensor {kind}: {source}")]
    ReadFault {
        /// Sensor kind
        kind: SensorKind,
        /// Driver error
        #[source]
        source: DeviceError,
    },
}

impl SensorError {
    /// Sensor the error refers to.
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorError::NotAvailable { kind } | SensorError::ReadFault { kind, .. } => *kind,
        }
    }
}

/// Result type for sensor reads.
pub type SensorResult<T> = Result<T, SensorError>;
