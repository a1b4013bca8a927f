//! Change filter
//!
//! Decides, channel by channel, whether a new value differs enough from the
//! last reported one to be worth sending over the cellular link.
//!
//! | channel | test | threshold |
//! |---|---|---|
//! | scalars (3, 4, 5, 6) | `abs(delta)` | `> 1.0` |
//! | accel (10) | sum of per-axis `abs(delta)` | `> 0.5` m/s² |
//! | gyro (9) | sum of per-axis `abs(delta)` | `>= 0.1` rad/s |
//! | color (7) | Euclidean RGB distance | `>= 200`, baseline only |
//!
//! Vector channels use the Manhattan sum rather than the Euclidean norm: it
//! is what the module's FPU-less core evaluates cheaply every cycle.
//!
//! A color change moves the baseline but is not put in the frame; only the
//! first color reading after a reset is reported.

use fieldlink_core::{Channel, ChannelValue};
use fieldlink_sensors::{Rgb, Vector3};
use std::collections::BTreeMap;

/// Minimum change for temperature, humidity and pressure (unit-native).
pub const SCALAR_THRESHOLD: f64 = 1.0;
/// Aggregate accelerometer change, m/s².
pub const ACCEL_THRESHOLD: f64 = 0.5;
/// Aggregate gyroscope change, rad/s.
pub const GYRO_THRESHOLD: f64 = 0.1;
/// RGB distance that moves the color baseline.
pub const COLOR_THRESHOLD: f64 = 200.0;

/// Scalar channels report on a strictly-greater delta.
pub fn scalar_changed(previous: Option<f64>, current: f64) -> bool {
    match previous {
        None => true,
        Some(previous) => (current - previous).abs() > SCALAR_THRESHOLD,
    }
}

/// Sum of absolute per-axis differences.
pub fn manhattan_delta(a: &Vector3, b: &Vector3) -> f64 {
    a.iter().zip(b.iter()).map(|(a, b)| (a - b).abs()).sum()
}

/// Accelerometer: strictly greater than the threshold.
pub fn accel_changed(previous: Option<&Vector3>, current: &Vector3) -> bool {
    match previous {
        None => true,
        Some(previous) => manhattan_delta(previous, current) > ACCEL_THRESHOLD,
    }
}

/// Gyroscope: at or above the threshold.
pub fn gyro_changed(previous: Option<&Vector3>, current: &Vector3) -> bool {
    match previous {
        None => true,
        Some(previous) => manhattan_delta(previous, current) >= GYRO_THRESHOLD,
    }
}

/// Color: at or above the distance threshold.
pub fn color_changed(previous: Option<&Rgb>, current: &Rgb) -> bool {
    match previous {
        None => true,
        Some(previous) => previous.distance(current) >= COLOR_THRESHOLD,
    }
}

/// What to do with one channel's new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Put the value in the frame and make it the new baseline
    Report,
    /// Move the baseline without reporting
    Rebaseline,
    /// Not significant
    Skip,
}

/// Pure per-channel decision against a previous baseline.
pub fn verdict(channel: Channel, previous: Option<&ChannelValue>, current: &ChannelValue) -> Verdict {
    let Some(previous) = previous else {
        return Verdict::Report;
    };

    let significant = |changed: bool| if changed { Verdict::Report } else { Verdict::Skip };

    match (channel, previous, current) {
        (Channel::Accel, ChannelValue::Axes(previous), ChannelValue::Axes(current)) => {
            significant(accel_changed(Some(previous), current))
        }
        (Channel::Gyro, ChannelValue::Axes(previous), ChannelValue::Axes(current)) => {
            significant(gyro_changed(Some(previous), current))
        }
        (Channel::Color, ChannelValue::Rgb(previous), ChannelValue::Rgb(current)) => {
            let previous = Rgb::new(previous[0], previous[1], previous[2]);
            let current = Rgb::new(current[0], current[1], current[2]);
            if color_changed(Some(&previous), &current) {
                Verdict::Rebaseline
            } else {
                Verdict::Skip
            }
        }
        (_, ChannelValue::Scalar(previous), ChannelValue::Scalar(current)) => {
            significant(scalar_changed(Some(*previous), *current))
        }
        // Shape changed under us; treat like a first reading.
        _ => Verdict::Report,
    }
}

/// Whether `current` would be placed in the outbound frame.
pub fn should_report(channel: Channel, previous: Option<&ChannelValue>, current: &ChannelValue) -> bool {
    verdict(channel, previous, current) == Verdict::Report
}

/// Stateful filter holding the last reported value of every channel.
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    baselines: BTreeMap<Channel, ChannelValue>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Judge `current` and move the baseline when the verdict asks for it.
    pub fn evaluate(&mut self, channel: Channel, current: ChannelValue) -> Verdict {
        let verdict = verdict(channel, self.baselines.get(&channel), &current);
        if verdict != Verdict::Skip {
            self.baselines.insert(channel, current);
        }
        verdict
    }

    pub fn baseline(&self, channel: Channel) -> Option<&ChannelValue> {
        self.baselines.get(&channel)
    }

    /// Forget every baseline so the next reading of each channel reports.
    pub fn reset(&mut self) {
        self.baselines.clear();
    }

    /// True when no channel has a baseline.
    pub fn is_reset(&self) -> bool {
        self.baselines.is_empty()
    }
}
