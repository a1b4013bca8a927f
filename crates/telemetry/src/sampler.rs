//! Sampling loop
//!
//! One cycle: optional reconnect sweep, read every sensor in fixed order with
//! a short pause between reads, filter into a frame, deliver a non-empty
//! frame, then sleep. Pending on-demand reads are answered between cycles.

use crate::assembler::{snapshot_frame, FrameAssembler};
use crate::filter::ChangeFilter;
use crate::request::{read_channel, ReadHandle, ReadRequest, ReadRequests};
use fieldlink_core::{
    spawn_worker, Clock, DeliveryChannel, DeliveryReport, SamplingConfig, StopSignal, TelemetryFrame, Wake,
};
use fieldlink_sensors::{SensorError, SensorKind, SensorRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Frame mode used for periodic telemetry.
pub const TELEMETRY_FRAME_MODE: u8 = 1;

/// Timing and cadence of the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingSettings {
    pub cycle_interval: Duration,
    pub read_pause: Duration,
    /// Cycles between reconnect sweeps; also the status log cadence
    pub reconnect_period: u64,
    pub frame_mode: u8,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(1),
            read_pause: Duration::from_millis(100),
            reconnect_period: 30,
            frame_mode: TELEMETRY_FRAME_MODE,
        }
    }
}

impl SamplingSettings {
    pub fn from_config(sampling: &SamplingConfig, frame_mode: u8) -> Self {
        Self {
            cycle_interval: sampling.cycle_interval(),
            read_pause: sampling.read_pause(),
            reconnect_period: u64::from(sampling.reconnect_period.max(1)),
            frame_mode,
        }
    }
}

/// What happened during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Counter value the cycle ran with
    pub cycle: u64,
    pub reconnect_swept: bool,
    pub reconnected: Vec<SensorKind>,
    pub read_failures: Vec<SensorKind>,
    pub frame: TelemetryFrame,
    /// `None` when the frame was empty and nothing was sent
    pub delivery: Option<DeliveryReport>,
}

impl CycleReport {
    /// True when a delivery was attempted and ran out of attempts.
    pub fn exhausted(&self) -> bool {
        matches!(self.delivery, Some(report) if !report.is_delivered())
    }
}

/// Periodic sensor sampling worker.
pub struct SamplingLoop {
    registry: SensorRegistry,
    assembler: FrameAssembler,
    delivery: DeliveryChannel,
    clock: Arc<dyn Clock>,
    settings: SamplingSettings,
    cycle_counter: u64,
    requests: Option<ReadRequests>,
    stop: StopSignal,
}

impl SamplingLoop {
    pub fn new(
        registry: SensorRegistry,
        delivery: DeliveryChannel,
        clock: Arc<dyn Clock>,
        settings: SamplingSettings,
    ) -> Self {
        Self {
            registry,
            assembler: FrameAssembler::new(),
            delivery,
            clock,
            settings,
            cycle_counter: 0,
            requests: None,
            stop: StopSignal::new(),
        }
    }

    /// Answer on-demand reads from this queue between cycles.
    pub fn with_read_requests(mut self, requests: ReadRequests) -> Self {
        self.requests = Some(requests);
        self
    }

    /// Accept on-demand reads through a handle that wakes this loop.
    ///
    /// Set the stop signal first with [`with_stop_signal`](Self::with_stop_signal).
    pub fn with_request_queue(self, capacity: usize) -> (Self, ReadHandle) {
        let (handle, requests) = read_channel(capacity);
        let handle = handle.waking(self.stop.clone());
        (self.with_read_requests(requests), handle)
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &ChangeFilter {
        self.assembler.filter()
    }

    pub fn cycle_counter(&self) -> u64 {
        self.cycle_counter
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn log_status(&self) {
        let status = self.registry.status();
        let available = status.iter().filter(|s| s.available).count();
        for entry in &status {
            info!(sensor = %entry.kind, available = entry.available, "Sensor status");
        }
        info!(
            cycle = self.cycle_counter,
            available,
            total = status.len(),
            "Sensor availability summary"
        );
    }

    /// Run one sampling cycle without the trailing cycle sleep.
    pub fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.cycle_counter;
        let period = self.settings.reconnect_period.max(1);

        let reconnect_swept = cycle % period == 0;
        let reconnected = if reconnect_swept {
            self.registry.reconnect_sweep()
        } else {
            Vec::new()
        };
        if reconnect_swept && cycle > 0 {
            self.log_status();
        }
        self.cycle_counter += 1;

        let mut frame = TelemetryFrame::new();
        let mut read_failures = Vec::new();

        for (index, kind) in SensorKind::ALL.iter().copied().enumerate() {
            if index > 0 {
                self.clock.sleep(self.settings.read_pause);
            }

            match self.registry.read(kind) {
                Ok(reading) => {
                    self.assembler.ingest(&reading, &mut frame);
                }
                Err(SensorError::NotAvailable { .. }) => {
                    debug!(sensor = %kind, "Skipping unavailable sensor");
                }
                Err(e) => {
                    warn!(sensor = %kind, error = %e, "Sensor read failed");
                    read_failures.push(kind);
                }
            }
        }

        let delivery = if frame.is_empty() {
            debug!(cycle, "No significant change, nothing to send");
            None
        } else {
            let report = self.delivery.deliver_frame(self.settings.frame_mode, &frame);
            match report {
                DeliveryReport::Delivered { attempts } => {
                    debug!(cycle, channels = frame.len(), attempts, "Frame delivered");
                }
                DeliveryReport::Exhausted { attempts } => {
                    warn!(cycle, attempts, "Frame not delivered, resetting baselines");
                    self.assembler.reset_baselines();
                }
            }
            Some(report)
        };

        CycleReport {
            cycle,
            reconnect_swept,
            reconnected,
            read_failures,
            frame,
            delivery,
        }
    }

    fn answer(&mut self, request: ReadRequest) {
        let kinds: BTreeSet<SensorKind> = request
            .channels()
            .iter()
            .map(|channel| SensorKind::for_channel(*channel))
            .collect();

        let mut readings = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match self.registry.read(kind) {
                Ok(reading) => readings.push(reading),
                Err(e) => debug!(sensor = %kind, error = %e, "Omitting sensor from read reply"),
            }
        }

        let frame = snapshot_frame(&readings, request.channels());
        debug!(channels = frame.len(), "Answered property read");
        request.respond(frame);
    }

    /// Answer every queued on-demand read. Returns how many were served.
    pub fn serve_read_requests(&mut self) -> usize {
        let mut served = 0;
        while let Some(request) = self.requests.as_mut().and_then(ReadRequests::try_next) {
            self.answer(request);
            served += 1;
        }
        served
    }

    /// Pause between cycles. A nudge on the stop signal serves queued reads
    /// and the pause resumes for what is left of it.
    fn pause(&mut self, duration: Duration) {
        let started = Instant::now();
        let mut remaining = duration;

        while let Wake::Nudged = self.clock.pause(remaining, &self.stop) {
            self.serve_read_requests();
            remaining = duration.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
        }
    }

    /// Run cycles until the stop signal is raised.
    pub fn run(mut self) -> Self {
        info!(
            sensors = self.registry.len(),
            cycle_interval = ?self.settings.cycle_interval,
            "Sampling loop started"
        );

        while !self.stop.is_raised() {
            self.run_cycle();
            self.serve_read_requests();
            self.pause(self.settings.cycle_interval);
        }

        info!(cycles = self.cycle_counter, "Sampling loop stopped");
        self
    }

    /// Run on a dedicated worker thread named `sampling`.
    pub fn spawn(self) -> fieldlink_core::Result<JoinHandle<()>> {
        spawn_worker("sampling", move || {
            self.run();
        })
    }
}

impl std::fmt::Debug for SamplingLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingLoop")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("cycle_counter", &self.cycle_counter)
            .finish_non_exhaustive()
    }
}
