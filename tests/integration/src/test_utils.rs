//! Test utilities shared by the integration scenarios

use fieldlink_core::{TelemetryFrame, Transport};
use fieldlink_sensors::{DeviceError, DeviceHandle, Reading, SensorKind, Vector3};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Temperature/humidity reading
pub fn temp_humidity(temperature: f64, humidity: f64) -> Reading {
    Reading::TempHumidity {
        temperature,
        humidity,
    }
}

/// Motion reading
pub fn motion(accel: Vector3, gyro: Vector3) -> Reading {
    Reading::Motion { accel, gyro }
}

/// Device handle replaying scripted probe and read results.
///
/// An exhausted probe script fails; an exhausted read script faults unless
/// a steady reading was set.
pub struct ScriptedDevice {
    kind: SensorKind,
    probes: VecDeque<bool>,
    reads: VecDeque<Option<Reading>>,
    steady: Option<Reading>,
    read_calls: Arc<AtomicU32>,
}

impl ScriptedDevice {
    /// Device that answers its startup probe.
    pub fn present(kind: SensorKind) -> Self {
        Self {
            kind,
            probes: VecDeque::from(vec![true]),
            reads: VecDeque::new(),
            steady: None,
            read_calls: Arc::default(),
        }
    }

    /// Device that is not plugged in at startup.
    pub fn absent(kind: SensorKind) -> Self {
        Self {
            probes: VecDeque::new(),
            ..Self::present(kind)
        }
    }

    /// Results of the probes after startup, in order.
    pub fn then_probes(mut self, probes: &[bool]) -> Self {
        self.probes.extend(probes);
        self
    }

    /// Read results in order; `None` is a hardware fault.
    pub fn reads(mut self, reads: Vec<Option<Reading>>) -> Self {
        self.reads = reads.into();
        self
    }

    /// Keep returning `reading` once the read script runs out.
    pub fn then_steady(mut self, reading: Reading) -> Self {
        self.steady = Some(reading);
        self
    }

    /// Counter of hardware reads, shared with the test.
    pub fn read_counter(&self) -> Arc<AtomicU32> {
        self.read_calls.clone()
    }

    pub fn boxed(self) -> Box<dyn DeviceHandle> {
        Box::new(self)
    }
}

impl DeviceHandle for ScriptedDevice {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn init(&mut self) -> Result<(), DeviceError> {
        if self.probes.pop_front().unwrap_or(false) {
            Ok(())
        } else {
            Err(DeviceError::InitFault(format!("{} absent", self.kind)))
        }
    }

    fn read(&mut self) -> Result<Reading, DeviceError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.reads
            .pop_front()
            .unwrap_or(self.steady)
            .ok_or_else(|| DeviceError::HardwareFault(format!("{} nack", self.kind)))
    }
}

#[derive(Default)]
struct TransportLog {
    frames: Vec<(u8, TelemetryFrame)>,
    locations: Vec<String>,
    script: VecDeque<bool>,
}

/// Transport recording every publish attempt.
///
/// Acceptance follows the script, then `default_accept`. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<TransportLog>>,
    default_accept: bool,
    publish_delay: Duration,
    in_flight: Arc<AtomicBool>,
    overlaps: Arc<AtomicU32>,
}

impl RecordingTransport {
    /// Accepts everything.
    pub fn accepting() -> Self {
        Self {
            default_accept: true,
            ..Self::default()
        }
    }

    /// Rejects everything.
    pub fn rejecting() -> Self {
        Self::default()
    }

    /// Follows `script`, then rejects.
    pub fn scripted(script: &[bool]) -> Self {
        let transport = Self::default();
        transport.log.lock().unwrap().script.extend(script);
        transport
    }

    /// Hold every publish for `delay` to widen race windows.
    pub fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    pub fn frames(&self) -> Vec<(u8, TelemetryFrame)> {
        self.log.lock().unwrap().frames.clone()
    }

    pub fn locations(&self) -> Vec<String> {
        self.log.lock().unwrap().locations.clone()
    }

    /// Publishes that started while another was on the wire.
    pub fn overlaps(&self) -> u32 {
        self.overlaps.load(Ordering::SeqCst)
    }

    fn on_wire<F: FnOnce(&mut TransportLog)>(&self, record: F) -> bool {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        if !self.publish_delay.is_zero() {
            std::thread::sleep(self.publish_delay);
        }

        let accepted = {
            let mut log = self.log.lock().unwrap();
            record(&mut log);
            log.script.pop_front().unwrap_or(self.default_accept)
        };

        self.in_flight.store(false, Ordering::SeqCst);
        accepted
    }
}

impl Transport for RecordingTransport {
    fn publish_frame(&mut self, mode: u8, frame: &TelemetryFrame) -> bool {
        let accepted = self.on_wire(|log| log.frames.push((mode, frame.clone())));
        debug!(mode, accepted, channels = frame.len(), "Recorded frame publish");
        accepted
    }

    fn publish_location(&mut self, data: &str) -> bool {
        let accepted = self.on_wire(|log| log.locations.push(data.to_string()));
        debug!(accepted, data, "Recorded location publish");
        accepted
    }
}
