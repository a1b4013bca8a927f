//! Sensor registry with hot-plug support
//!
//! Sensors on the expansion header can be unplugged and re-plugged while the
//! node is running. The registry keeps one [`SensorState`] per kind and
//! isolates failures so a single disconnected wire never stops the others
//! from reporting.
//!
//! # State machine
//!
//! - `Available` → `Unavailable` only through a failed hardware read
//! - `Unavailable` → `Available` only through a successful reconnect probe
//!
//! Reads against an unavailable sensor fail fast without touching the bus.

use crate::device::DeviceHandle;
use crate::error::{DeviceError, SensorError, SensorResult};
use crate::kind::SensorKind;
use crate::reading::Reading;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Per-sensor state. Created once at startup and never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorState {
    /// Whether reads are attempted
    pub available: bool,
    /// Last successful reading
    pub last_value: Option<Reading>,
    /// Read faults and failed probes since the last successful read
    pub consecutive_faults: u32,
}

struct SensorSlot {
    device: Box<dyn DeviceHandle>,
    state: SensorState,
}

/// Availability snapshot for one sensor, used in status logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorStatus {
    /// Sensor kind
    pub kind: SensorKind,
    /// Whether reads are attempted
    pub available: bool,
}

/// Owner of every device handle and its availability state.
#[derive(Default)]
pub struct SensorRegistry {
    slots: BTreeMap<SensorKind, SensorSlot>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry and run the startup probe on every device.
    pub fn with_devices<I>(devices: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn DeviceHandle>>,
    {
        let mut registry = Self::new();
        for device in devices {
            registry.register(device);
        }
        registry
    }

    /// Register a device and probe it once.
    ///
    /// Probe failure is not fatal: the sensor starts unavailable and is
    /// retried by [`reconnect_sweep`](Self::reconnect_sweep). Returns the
    /// initial availability.
    pub fn register(&mut self, mut device: Box<dyn DeviceHandle>) -> bool {
        let kind = device.kind();
        let available = match device.init() {
            Ok(()) => {
                info!(sensor = %kind, "Sensor initialized");
                true
            }
            Err(e) => {
                warn!(sensor = %kind, error = %e, "Sensor not detected at startup");
                false
            }
        };

        let state = SensorState {
            available,
            last_value: None,
            consecutive_faults: u32::from(!available),
        };
        if self.slots.insert(kind, SensorSlot { device, state }).is_some() {
            warn!(sensor = %kind, "Replaced previously registered device");
        }
        available
    }

    /// Read one sensor.
    ///
    /// Fails with [`SensorError::NotAvailable`] without hardware access when
    /// the sensor is unavailable or has no registered device. A failed read
    /// marks the sensor unavailable and fails with [`SensorError::ReadFault`].
    pub fn read(&mut self, kind: SensorKind) -> SensorResult<Reading> {
        let slot = match self.slots.get_mut(&kind) {
            Some(slot) if slot.state.available => slot,
            _ => return Err(SensorError::NotAvailable { kind }),
        };

        let result = slot.device.read().and_then(|reading| {
            if reading.kind() != kind {
                Err(DeviceError::HardwareFault(format!(
                    "device returned a {} payload",
                    reading.kind()
                )))
            } else if !reading.is_finite() {
                Err(DeviceError::HardwareFault("non-finite measurement".to_string()))
            } else {
                Ok(reading)
            }
        });

        match result {
            Ok(reading) => {
                slot.state.last_value = Some(reading);
                slot.state.consecutive_faults = 0;
                Ok(reading)
            }
            Err(source) => {
                slot.state.available = false;
                slot.state.consecutive_faults = slot.state.consecutive_faults.saturating_add(1);
                warn!(sensor = %kind, error = %source, "Sensor read failed, marking disconnected");
                Err(SensorError::ReadFault { kind, source })
            }
        }
    }

    /// Probe every unavailable sensor once.
    ///
    /// Returns the kinds that came back.
    pub fn reconnect_sweep(&mut self) -> Vec<SensorKind> {
        let mut reconnected = Vec::new();

        for (kind, slot) in self.slots.iter_mut() {
            if slot.state.available {
                continue;
            }

            match slot.device.init() {
                Ok(()) => {
                    slot.state.available = true;
                    info!(sensor = %kind, "Sensor reconnected");
                    reconnected.push(*kind);
                }
                Err(e) => {
                    slot.state.consecutive_faults = slot.state.consecutive_faults.saturating_add(1);
                    debug!(sensor = %kind, error = %e, "Reconnect probe failed");
                }
            }
        }

        reconnected
    }

    /// Whether `kind` is registered and currently available.
    pub fn is_available(&self, kind: SensorKind) -> bool {
        self.slots
            .get(&kind)
            .map(|slot| slot.state.available)
            .unwrap_or(false)
    }

    /// State of `kind`, if registered.
    pub fn state(&self, kind: SensorKind) -> Option<&SensorState> {
        self.slots.get(&kind).map(|slot| &slot.state)
    }

    /// Availability of every registered sensor, in sampling order.
    pub fn status(&self) -> Vec<SensorStatus> {
        self.slots
            .iter()
            .map(|(kind, slot)| SensorStatus {
                kind: *kind,
                available: slot.state.available,
            })
            .collect()
    }

    /// Registered kinds, in sampling order.
    pub fn kinds(&self) -> Vec<SensorKind> {
        self.slots.keys().copied().collect()
    }

    /// Number of registered sensors.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no sensor is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(kind, slot)| (kind, &slot.state)))
            .finish()
    }
}
