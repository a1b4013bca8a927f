//! Simulated hardware for running the node off-target.
//!
//! Devices random-walk around plausible indoor values and occasionally drop
//! off the bus, the modem serves one cell and a GGA stream, and the transport
//! logs every publish and rejects a configurable share of them. The platform
//! side periodically asks for a property read and a location report.

use fieldlink_core::{TelemetryFrame, Transport};
use fieldlink_location::{CellInfo, CellInfoProvider, LocationHandle, NmeaProvider, ReportOutcome, TriggerError};
use fieldlink_sensors::convert::{accel_from_raw, gyro_from_raw, unpack_rgb888};
use fieldlink_sensors::{DeviceError, DeviceHandle, Reading, SensorKind};
use rand::rngs::StdRng;
use fieldlink_telemetry::{channels_from_ids, ReadHandle, RequestError};
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Chance a plugged device faults on a read.
const UNPLUG_PROBABILITY: f64 = 0.01;
/// Chance an unplugged device answers a reconnect probe.
const REPLUG_PROBABILITY: f64 = 0.5;
/// Channel ids in the platform's property read: every scalar plus motion.
pub const PLATFORM_READ_IDS: [u8; 7] = [3, 4, 5, 6, 7, 9, 10];

pub struct SimulatedDevice {
    kind: SensorKind,
    rng: StdRng,
    plugged: bool,
    temperature: f64,
    humidity: f64,
    pressure: f64,
    accel_raw: [i16; 3],
    gyro_raw: [i16; 3],
    color: u32,
}

impl SimulatedDevice {
    pub fn new(kind: SensorKind, seed: u64) -> Self {
        Self {
            kind,
            rng: StdRng::seed_from_u64(seed),
            plugged: true,
            temperature: 21.0,
            humidity: 45.0,
            pressure: 1013.0,
            accel_raw: [0, 0, 16384],
            gyro_raw: [0; 3],
            color: 0x80_80_80,
        }
    }

    /// One device per sensor kind, seeded from `seed`.
    pub fn fleet(seed: u64) -> Vec<Box<dyn DeviceHandle>> {
        SensorKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| Box::new(Self::new(*kind, seed.wrapping_add(i as u64))) as Box<dyn DeviceHandle>)
            .collect()
    }

    fn walk(&mut self, value: f64, step: f64, min: f64, max: f64) -> f64 {
        (value + self.rng.gen_range(-step..=step)).clamp(min, max)
    }

    fn walk_axes(&mut self, axes: [i16; 3], step: i16) -> [i16; 3] {
        axes.map(|axis| axis.saturating_add(self.rng.gen_range(-step..=step)))
    }
}

impl DeviceHandle for SimulatedDevice {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn init(&mut self) -> Result<(), DeviceError> {
        if !self.plugged && self.rng.gen_bool(REPLUG_PROBABILITY) {
            self.plugged = true;
        }
        if self.plugged {
            Ok(())
        } else {
            Err(DeviceError::InitFault(format!("{} did not ack", self.kind)))
        }
    }

    fn read(&mut self) -> Result<Reading, DeviceError> {
        if !self.plugged || self.rng.gen_bool(UNPLUG_PROBABILITY) {
            self.plugged = false;
            debug!(sensor = %self.kind, "Simulated unplug");
            return Err(DeviceError::HardwareFault("i2c nack".into()));
        }

        let reading = match self.kind {
            SensorKind::TempHumidity => {
                self.temperature = self.walk(self.temperature, 0.6, -20.0, 60.0);
                self.humidity = self.walk(self.humidity, 0.8, 0.0, 100.0);
                Reading::TempHumidity {
                    temperature: self.temperature,
                    humidity: self.humidity,
                }
            }
            SensorKind::PressureTemp => {
                self.pressure = self.walk(self.pressure, 0.7, 900.0, 1100.0);
                Reading::PressureTemp {
                    pressure: self.pressure,
                    temperature: self.temperature + 0.3,
                }
            }
            SensorKind::Motion => {
                self.accel_raw = self.walk_axes(self.accel_raw, 600);
                self.gyro_raw = self.walk_axes(self.gyro_raw, 40);
                Reading::Motion {
                    accel: accel_from_raw(self.accel_raw),
                    gyro: gyro_from_raw(self.gyro_raw),
                }
            }
            SensorKind::Color => {
                self.color = self.rng.gen_range(0..=0xFF_FF_FF);
                Reading::Color(unpack_rgb888(self.color))
            }
        };

        Ok(reading)
    }
}

/// Modem with one serving cell and a GNSS receiver that acquires a fix
/// after a few reads.
pub struct SimulatedModem {
    rng: StdRng,
    nmea_reads: u32,
}

impl SimulatedModem {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            nmea_reads: 0,
        }
    }
}

impl CellInfoProvider for SimulatedModem {
    fn serving_cell(&mut self) -> Option<CellInfo> {
        Some(CellInfo {
            cell_id: 232_301_330,
            mcc: 460,
            mnc: 0,
            tac: 22_136,
            signal: self.rng.gen_range(10..=31),
        })
    }
}

impl NmeaProvider for SimulatedModem {
    fn is_running(&mut self) -> bool {
        true
    }

    fn read_nmea(&mut self) -> Option<String> {
        self.nmea_reads += 1;
        let quality = if self.nmea_reads > 3 { 1 } else { 0 };
        Some(format!(
            "$GNRMC,120000.000,A\n$GNGGA,120000.000,3114.{:04},N,12128.{:04},E,{},9,0.9,12.0,M,8.0,M,,*5A\n",
            self.rng.gen_range(0..10_000),
            self.rng.gen_range(0..10_000),
            quality
        ))
    }
}

/// Transport that logs publishes and rejects a share of them.
pub struct LoggingTransport {
    rng: StdRng,
    failure_rate: f64,
}

impl LoggingTransport {
    pub fn new(failure_rate: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    fn accepted(&mut self) -> bool {
        !self.rng.gen_bool(self.failure_rate)
    }
}

impl Transport for LoggingTransport {
    fn publish_frame(&mut self, mode: u8, frame: &TelemetryFrame) -> bool {
        let accepted = self.accepted();
        let payload = frame.to_json().unwrap_or_default();
        info!(mode, accepted, payload = %payload, "Publish frame");
        accepted
    }

    fn publish_location(&mut self, data: &str) -> bool {
        let accepted = self.accepted();
        info!(accepted, data, "Publish location");
        accepted
    }
}

/// Answers to one platform poll.
#[derive(Debug)]
pub struct PlatformPoll {
    pub read: Result<TelemetryFrame, RequestError>,
    pub location: Option<Result<ReportOutcome, TriggerError>>,
}

/// Platform side of the link: asks the workers for data on its own schedule.
pub struct SimulatedPlatform {
    read: ReadHandle,
    location: Option<LocationHandle>,
    interval: Duration,
}

impl SimulatedPlatform {
    pub fn new(read: ReadHandle, location: Option<LocationHandle>, interval: Duration) -> Self {
        Self {
            read,
            location,
            interval,
        }
    }

    /// One property read, then one location report if reporting is enabled.
    pub async fn poll_once(&self) -> PlatformPoll {
        let read = self.read.request_async(channels_from_ids(&PLATFORM_READ_IDS)).await;
        match &read {
            Ok(frame) => info!(channels = frame.len(), "Platform property read answered"),
            Err(e) => warn!(error = %e, "Platform property read failed"),
        }

        let location = match &self.location {
            Some(handle) => {
                let outcome = handle.request_async().await;
                match &outcome {
                    Ok(outcome) => info!(?outcome, "Platform location request answered"),
                    Err(e) => warn!(error = %e, "Platform location request failed"),
                }
                Some(outcome)
            }
            None => None,
        };

        PlatformPoll { read, location }
    }

    /// Poll every interval until a worker stops answering.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick is immediate; let the workers finish their first cycle.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let poll = self.poll_once().await;
            let stopped = matches!(poll.read, Err(RequestError::ServiceStopped))
                || matches!(poll.location, Some(Err(TriggerError::ServiceStopped)));
            if stopped {
                debug!("Platform polling stopped");
                break;
            }
        }
    }
}
