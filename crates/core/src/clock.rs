//! Time source used by the reporting loops.
//!
//! Loops never call `std::thread::sleep` directly; they go through a
//! [`Clock`] so tests can run hours of schedule in microseconds.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Why a [`Clock::pause`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The full duration passed
    Elapsed,
    /// The stop signal was raised
    Stopped,
    /// Someone asked the worker to look at its queue
    Nudged,
}

/// Blocking delay capability.
pub trait Clock: Send + Sync {
    /// Suspend the calling worker for `duration`.
    fn sleep(&self, duration: Duration);

    /// Suspend for `duration`, returning early when `signal` is raised or
    /// nudged.
    ///
    /// The default sleeps the full duration and only reports what happened
    /// meanwhile; it never returns [`Wake::Nudged`].
    fn pause(&self, duration: Duration, signal: &StopSignal) -> Wake {
        self.sleep(duration);
        signal.take_nudge();
        if signal.is_raised() {
            Wake::Stopped
        } else {
            Wake::Elapsed
        }
    }
}

/// Wall-clock implementation backed by the OS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn pause(&self, duration: Duration, signal: &StopSignal) -> Wake {
        signal.wait(duration)
    }
}

#[derive(Debug, Default)]
struct SignalState {
    raised: bool,
    nudged: bool,
}

#[derive(Debug, Default)]
struct SignalInner {
    state: Mutex<SignalState>,
    changed: Condvar,
}

/// Cooperative stop flag shared between a worker and its owner.
///
/// Loops check it between cycles; an in-flight cycle always completes. A
/// worker pausing through [`Clock::pause`] wakes as soon as it is raised.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<SignalInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SignalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn raise(&self) {
        self.state().raised = true;
        self.inner.changed.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        self.state().raised
    }

    /// Wake a pausing worker without stopping it.
    pub fn nudge(&self) {
        self.state().nudged = true;
        self.inner.changed.notify_all();
    }

    /// Clear a pending nudge, returning whether there was one.
    pub fn take_nudge(&self) -> bool {
        std::mem::take(&mut self.state().nudged)
    }

    /// Block up to `timeout` for a raise or a nudge.
    pub fn wait(&self, timeout: Duration) -> Wake {
        let guard = self.state();
        let (mut state, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |state| !state.raised && !state.nudged)
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.raised {
            Wake::Stopped
        } else if std::mem::take(&mut state.nudged) {
            Wake::Nudged
        } else {
            Wake::Elapsed
        }
    }
}

/// Clock that returns immediately and records every requested delay.
///
/// Optionally raises a [`StopSignal`] once a given number of sleeps has been
/// requested, which bounds otherwise endless loops.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    stop_after: Option<(usize, StopSignal)>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `signal` when the `count`-th sleep is requested.
    pub fn stopping_after(count: usize, signal: StopSignal) -> Self {
        Self {
            sleeps: Arc::default(),
            stop_after: Some((count, signal)),
        }
    }

    /// All delays requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sum of all requested delays.
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for RecordingClock {
    fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self
                .sleeps
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sleeps.push(duration);
            sleeps.len()
        };

        if let Some((limit, signal)) = &self.stop_after {
            if count >= *limit {
                signal.raise();
            }
        }
    }
}
