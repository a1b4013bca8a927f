//! On-demand property reads
//!
//! The sensor registry belongs to the sampling worker, so callers never touch
//! it directly. A [`ReadHandle`] posts a [`ReadRequest`] on a bounded queue
//! and the sampling loop answers it between cycles with an unfiltered frame.
//! A handle that knows the loop's stop signal also nudges the loop awake, so
//! the answer does not wait for the cycle pause to run out.

use fieldlink_core::{Channel, StopSignal, TelemetryFrame};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Default number of requests that may wait for the sampling loop.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Errors returned to the requesting side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The sampling loop has stopped and will not answer
    #[error("Sampling service stopped")]
    ServiceStopped,

    /// Too many requests are already queued
    #[error("Read request queue full")]
    QueueFull,
}

/// One pending property read.
#[derive(Debug)]
pub struct ReadRequest {
    channels: Vec<Channel>,
    reply: oneshot::Sender<TelemetryFrame>,
}

impl ReadRequest {
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Send the answer back. A requester that gave up is not an error.
    pub fn respond(self, frame: TelemetryFrame) {
        if self.reply.send(frame).is_err() {
            debug!("Read requester went away before the reply");
        }
    }
}

/// Map platform channel ids to channels, dropping unknown ids and duplicates.
pub fn channels_from_ids(ids: &[u8]) -> Vec<Channel> {
    let mut channels: Vec<Channel> = ids.iter().filter_map(|id| Channel::from_id(*id)).collect();
    channels.sort();
    channels.dedup();
    channels
}

/// Client side of the read service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReadHandle {
    tx: mpsc::Sender<ReadRequest>,
    wake: Option<StopSignal>,
}

impl ReadHandle {
    /// Nudge `signal` after every queued request.
    pub fn waking(mut self, signal: StopSignal) -> Self {
        self.wake = Some(signal);
        self
    }

    fn nudge(&self) {
        if let Some(signal) = &self.wake {
            signal.nudge();
        }
    }

    /// Queue a request without waiting for the answer.
    pub fn submit(&self, channels: Vec<Channel>) -> Result<PendingRead, RequestError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(ReadRequest { channels, reply })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => RequestError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => RequestError::ServiceStopped,
            })?;
        self.nudge();
        Ok(PendingRead { rx })
    }

    /// Request `channels` and block the calling thread until answered.
    ///
    /// Must not be called from inside an async task; use [`ReadHandle::request_async`].
    pub fn request(&self, channels: Vec<Channel>) -> Result<TelemetryFrame, RequestError> {
        self.submit(channels)?.wait()
    }

    /// Request by raw platform ids; unknown ids are ignored.
    pub fn request_ids(&self, ids: &[u8]) -> Result<TelemetryFrame, RequestError> {
        self.request(channels_from_ids(ids))
    }

    pub async fn request_async(&self, channels: Vec<Channel>) -> Result<TelemetryFrame, RequestError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ReadRequest { channels, reply })
            .await
            .map_err(|_| RequestError::ServiceStopped)?;
        self.nudge();
        rx.await.map_err(|_| RequestError::ServiceStopped)
    }
}

/// Reply slot of a submitted request.
#[derive(Debug)]
pub struct PendingRead {
    rx: oneshot::Receiver<TelemetryFrame>,
}

impl PendingRead {
    /// Block until the sampling loop answers.
    pub fn wait(self) -> Result<TelemetryFrame, RequestError> {
        self.rx.blocking_recv().map_err(|_| RequestError::ServiceStopped)
    }

    /// The answer if it has already arrived.
    pub fn try_take(&mut self) -> Option<Result<TelemetryFrame, RequestError>> {
        match self.rx.try_recv() {
            Ok(frame) => Some(Ok(frame)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RequestError::ServiceStopped)),
        }
    }
}

/// Service side, drained by the sampling loop.
#[derive(Debug)]
pub struct ReadRequests {
    rx: mpsc::Receiver<ReadRequest>,
}

impl ReadRequests {
    /// Next queued request, if any. Never blocks.
    pub fn try_next(&mut self) -> Option<ReadRequest> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected handle/service pair.
pub fn read_channel(capacity: usize) -> (ReadHandle, ReadRequests) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ReadHandle { tx, wake: None }, ReadRequests { rx })
}
