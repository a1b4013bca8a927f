//! Delivery channel with bounded retries
//!
//! The transport to the remote platform is a single-owner resource. Both
//! reporting loops publish through one [`DeliveryChannel`]; every attempt
//! holds the transport lock for its full duration, so no two publishes are
//! ever on the wire at once.
//!
//! Attempts are made back-to-back with no delay. The caller's normal loop
//! sleep is the only backoff after an exhausted budget.

use crate::frame::TelemetryFrame;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Publish capability supplied by the transport SDK.
pub trait Transport: Send {
    /// Publish one telemetry frame. Returns `true` when the platform accepted it.
    fn publish_frame(&mut self, mode: u8, frame: &TelemetryFrame) -> bool;

    /// Publish one location fix string. Returns `true` when accepted.
    fn publish_location(&mut self, data: &str) -> bool;
}

/// Result of a single publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    TransientFailure,
}

impl From<bool> for DeliveryOutcome {
    fn from(accepted: bool) -> Self {
        if accepted {
            DeliveryOutcome::Success
        } else {
            DeliveryOutcome::TransientFailure
        }
    }
}

/// Result of a whole bounded delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryReport {
    /// Accepted on attempt number `attempts`
    Delivered { attempts: u32 },
    /// Every attempt failed
    Exhausted { attempts: u32 },
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryReport::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryReport::Delivered { attempts } | DeliveryReport::Exhausted { attempts } => {
                *attempts
            }
        }
    }
}

/// Shared, mutually exclusive publish path.
#[derive(Clone)]
pub struct DeliveryChannel {
    transport: Arc<Mutex<dyn Transport>>,
    max_attempts: u32,
}

impl DeliveryChannel {
    /// Default attempts per frame or fix.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::with_max_attempts(transport, Self::DEFAULT_MAX_ATTEMPTS)
    }

    /// A budget of zero is raised to one; a publish is always tried.
    pub fn with_max_attempts<T: Transport + 'static>(transport: T, max_attempts: u32) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn lock(&self) -> MutexGuard<'_, dyn Transport + 'static> {
        self.transport.lock().unwrap_or_else(|poisoned| {
            warn!("Transport lock poisoned by a panicked publisher, recovering");
            poisoned.into_inner()
        })
    }

    /// One publish attempt under the transport lock.
    pub fn attempt<F>(&self, publish: F) -> DeliveryOutcome
    where
        F: FnOnce(&mut dyn Transport) -> bool,
    {
        let mut transport = self.lock();
        publish(&mut *transport).into()
    }

    fn deliver_with<F>(&self, payload: &'static str, mut publish: F) -> DeliveryReport
    where
        F: FnMut(&mut dyn Transport) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            match self.attempt(&mut publish) {
                DeliveryOutcome::Success => {
                    debug!(payload, attempt, "Publish accepted");
                    return DeliveryReport::Delivered { attempts: attempt };
                }
                DeliveryOutcome::TransientFailure => {
                    debug!(payload, attempt, max_attempts = self.max_attempts, "Publish attempt failed");
                }
            }
        }

        warn!(payload, attempts = self.max_attempts, "Delivery retry budget exhausted");
        DeliveryReport::Exhausted {
            attempts: self.max_attempts,
        }
    }

    /// Deliver a telemetry frame with the bounded retry budget.
    pub fn deliver_frame(&self, mode: u8, frame: &TelemetryFrame) -> DeliveryReport {
        self.deliver_with("frame", |transport| transport.publish_frame(mode, frame))
    }

    /// Deliver a location fix with the bounded retry budget.
    pub fn deliver_location(&self, data: &str) -> DeliveryReport {
        self.deliver_with("location", |transport| transport.publish_location(data))
    }
}

impl std::fmt::Debug for DeliveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryChannel")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
