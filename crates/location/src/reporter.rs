//! Location reporting loop
//!
//! Runs beside the sampling loop and publishes a fix through the same
//! [`DeliveryChannel`], so location and telemetry publishes never overlap.
//! A delivered fix is followed by a long pause; a missing fix or an
//! exhausted delivery by a short retry pause. Queued on-demand reports wake
//! the worker from its pause and are answered before the pause resumes.

use crate::request::{report_channel, LocationHandle, ReportRequests};
use crate::source::LocationSource;
use fieldlink_core::{
    spawn_worker, Clock, DeliveryChannel, DeliveryReport, LocationConfig, StopSignal, Wake,
};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one fix read + delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The source had no fix
    NoFix,
    /// Fix accepted by the platform
    Delivered { attempts: u32 },
    /// Every delivery attempt failed
    GaveUp { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSettings {
    /// Pause after no fix or a failed delivery
    pub retry_interval: Duration,
    /// Pause after a delivered fix
    pub report_interval: Duration,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(2),
            report_interval: Duration::from_secs(1800),
        }
    }
}

impl From<&LocationConfig> for LocationSettings {
    fn from(config: &LocationConfig) -> Self {
        Self {
            retry_interval: config.retry_interval(),
            report_interval: config.report_interval(),
        }
    }
}

pub struct LocationReporter {
    source: Box<dyn LocationSource>,
    delivery: DeliveryChannel,
    clock: Arc<dyn Clock>,
    settings: LocationSettings,
    stop: StopSignal,
    requests: Option<ReportRequests>,
}

impl LocationReporter {
    pub fn new(
        source: Box<dyn LocationSource>,
        delivery: DeliveryChannel,
        clock: Arc<dyn Clock>,
        settings: LocationSettings,
    ) -> Self {
        Self {
            source,
            delivery,
            clock,
            settings,
            stop: StopSignal::new(),
            requests: None,
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Accept on-demand reports through the returned handle.
    ///
    /// The handle wakes the worker through its stop signal, so set that
    /// first with [`with_stop_signal`](Self::with_stop_signal).
    pub fn with_request_queue(mut self, capacity: usize) -> (Self, LocationHandle) {
        let (handle, requests) = report_channel(capacity, self.stop.clone());
        self.requests = Some(requests);
        (self, handle)
    }

    /// Run one report per queued request. Returns how many were served.
    pub fn serve_requests(&mut self) -> usize {
        let mut served = 0;
        while let Some(request) = self.requests.as_mut().and_then(ReportRequests::try_next) {
            let outcome = self.report_once();
            debug!(?outcome, "Answered on-demand location report");
            request.respond(outcome);
            served += 1;
        }
        served
    }

    /// Read one fix and deliver it with the bounded retry budget. Never sleeps.
    pub fn report_once(&mut self) -> ReportOutcome {
        let Some(fix) = self.source.get_fix() else {
            debug!(source = self.source.name(), "No location fix");
            return ReportOutcome::NoFix;
        };

        match self.delivery.deliver_location(&fix) {
            DeliveryReport::Delivered { attempts } => {
                info!(source = self.source.name(), attempts, "Location reported");
                ReportOutcome::Delivered { attempts }
            }
            DeliveryReport::Exhausted { attempts } => {
                warn!(source = self.source.name(), attempts, "Location report failed");
                ReportOutcome::GaveUp { attempts }
            }
        }
    }

    /// Pause that follows `outcome` in the periodic loop.
    pub fn pause_after(&self, outcome: ReportOutcome) -> Duration {
        match outcome {
            ReportOutcome::Delivered { .. } => self.settings.report_interval,
            ReportOutcome::NoFix | ReportOutcome::GaveUp { .. } => self.settings.retry_interval,
        }
    }

    /// Pause for `duration`, serving on-demand reports whenever woken for
    /// them. Returns early only when stopped.
    fn pause(&mut self, duration: Duration) {
        let started = Instant::now();
        let mut remaining = duration;

        while let Wake::Nudged = self.clock.pause(remaining, &self.stop) {
            self.serve_requests();
            remaining = duration.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
        }
    }

    /// One loop iteration: report, then pause accordingly.
    pub fn run_iteration(&mut self) -> ReportOutcome {
        let outcome = self.report_once();
        self.pause(self.pause_after(outcome));
        outcome
    }

    /// Report until the stop signal is raised.
    pub fn run(mut self) -> Self {
        info!(
            source = self.source.name(),
            report_interval_secs = self.settings.report_interval.as_secs(),
            "Location reporting started"
        );

        while !self.stop.is_raised() {
            self.serve_requests();
            self.run_iteration();
        }

        info!("Location reporting stopped");
        self
    }

    /// Run on a dedicated worker thread named `location`.
    pub fn spawn(self) -> fieldlink_core::Result<JoinHandle<()>> {
        spawn_worker("location", move || {
            self.run();
        })
    }
}

impl std::fmt::Debug for LocationReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationReporter")
            .field("source", &self.source.name())
            .field("delivery", &self.delivery)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
