//! Device handle capability
//!
//! The register-level drivers live outside this workspace. Each physical
//! sensor is handed to the registry as a [`DeviceHandle`].

use crate::error::DeviceError;
use crate::kind::SensorKind;
use crate::reading::Reading;

/// Capability wrapper around one physical sensor.
pub trait DeviceHandle: Send {
    /// Kind of sensor behind this handle.
    fn kind(&self) -> SensorKind;

    /// Run the device's identification/initialization sequence.
    ///
    /// Called once at startup and again by every reconnect probe.
    fn init(&mut self) -> Result<(), DeviceError>;

    /// Perform one blocking measurement.
    fn read(&mut self) -> Result<Reading, DeviceError>;
}
