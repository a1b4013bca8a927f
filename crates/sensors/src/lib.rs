//! FieldLink Sensors
//!
//! Sensor kinds, reading payloads, the device handle capability and the
//! hot-plug aware sensor registry.

#![warn(missing_docs)]

pub mod convert;
pub mod device;
pub mod error;
pub mod kind;
pub mod reading;
pub mod registry;

pub use device::DeviceHandle;
pub use error::{DeviceError, SensorError, SensorResult};
pub use kind::SensorKind;
pub use reading::{Reading, Rgb, Vector3};
pub use registry::{SensorRegistry, SensorState, SensorStatus};
