//! On-demand location reports
//!
//! The platform can ask for a fix at any time. Requests are queued for the
//! reporting worker, which is woken from its pause, runs one
//! [`LocationReporter::report_once`](crate::LocationReporter::report_once)
//! per request and answers with the outcome.

use crate::reporter::ReportOutcome;
use fieldlink_core::StopSignal;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Errors returned to the requesting side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// The reporting worker has stopped
    #[error("Location service stopped")]
    ServiceStopped,

    /// Too many reports are already queued
    #[error("Location request queue full")]
    QueueFull,
}

/// One queued report.
#[derive(Debug)]
pub struct ReportRequest {
    reply: oneshot::Sender<ReportOutcome>,
}

impl ReportRequest {
    pub fn respond(self, outcome: ReportOutcome) {
        if self.reply.send(outcome).is_err() {
            debug!("Location requester went away before the reply");
        }
    }
}

/// Cloneable trigger for the reporting worker.
#[derive(Debug, Clone)]
pub struct LocationHandle {
    tx: mpsc::Sender<ReportRequest>,
    wake: StopSignal,
}

impl LocationHandle {
    /// Queue a report and wake the worker.
    pub fn submit(&self) -> Result<PendingReport, TriggerError> {
        let (reply, rx) = oneshot::channel();
        self.tx.try_send(ReportRequest { reply }).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TriggerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TriggerError::ServiceStopped,
        })?;
        self.wake.nudge();
        Ok(PendingReport { rx })
    }

    /// Trigger a report and block until it has run.
    ///
    /// Must not be called from inside an async task; use
    /// [`LocationHandle::request_async`].
    pub fn request(&self) -> Result<ReportOutcome, TriggerError> {
        self.submit()?.wait()
    }

    pub async fn request_async(&self) -> Result<ReportOutcome, TriggerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ReportRequest { reply })
            .await
            .map_err(|_| TriggerError::ServiceStopped)?;
        self.wake.nudge();
        rx.await.map_err(|_| TriggerError::ServiceStopped)
    }
}

/// Reply slot of a submitted report.
#[derive(Debug)]
pub struct PendingReport {
    rx: oneshot::Receiver<ReportOutcome>,
}

impl PendingReport {
    pub fn wait(self) -> Result<ReportOutcome, TriggerError> {
        self.rx.blocking_recv().map_err(|_| TriggerError::ServiceStopped)
    }

    pub fn try_take(&mut self) -> Option<Result<ReportOutcome, TriggerError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(Ok(outcome)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(TriggerError::ServiceStopped)),
        }
    }
}

/// Worker side of the queue.
#[derive(Debug)]
pub struct ReportRequests {
    rx: mpsc::Receiver<ReportRequest>,
}

impl ReportRequests {
    pub fn try_next(&mut self) -> Option<ReportRequest> {
        self.rx.try_recv().ok()
    }
}

/// Connected trigger/queue pair. `wake` must be the signal the worker pauses on.
pub fn report_channel(capacity: usize, wake: StopSignal) -> (LocationHandle, ReportRequests) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (LocationHandle { tx, wake }, ReportRequests { rx })
}
