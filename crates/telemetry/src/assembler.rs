//! Frame assembler
//!
//! Turns the readings of one sampling cycle into a [`TelemetryFrame`]
//! holding only the channels the change filter judged significant.

use crate::filter::{ChangeFilter, Verdict};
use fieldlink_core::{Channel, ChannelValue, TelemetryFrame};
use fieldlink_sensors::Reading;
use tracing::debug;

/// Value as it goes on the wire: scalars at two decimals.
fn wire_value(value: ChannelValue) -> ChannelValue {
    match value {
        ChannelValue::Scalar(scalar) => ChannelValue::rounded_scalar(scalar),
        other => other,
    }
}

/// Builds frames through a stateful [`ChangeFilter`].
#[derive(Debug, Default)]
pub struct FrameAssembler {
    filter: ChangeFilter,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every channel of `reading` through the filter and insert the
    /// significant ones into `frame`. Returns the channels inserted.
    pub fn ingest(&mut self, reading: &Reading, frame: &mut TelemetryFrame) -> Vec<Channel> {
        let mut inserted = Vec::new();

        for channel in reading.kind().channels() {
            let Some(value) = reading.channel_value(*channel) else {
                continue;
            };

            match self.filter.evaluate(*channel, value) {
                Verdict::Report => {
                    debug!(channel = %channel, value = ?value, "Channel changed");
                    frame.insert(*channel, wire_value(value));
                    inserted.push(*channel);
                }
                Verdict::Rebaseline => {
                    debug!(channel = %channel, value = ?value, "Channel baseline moved");
                }
                Verdict::Skip => {}
            }
        }

        inserted
    }

    /// Build a frame from a batch of readings.
    pub fn assemble<'a, I>(&mut self, readings: I) -> TelemetryFrame
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut frame = TelemetryFrame::new();
        for reading in readings {
            self.ingest(reading, &mut frame);
        }
        frame
    }

    /// Forget all baselines; the next reading of every channel reports.
    pub fn reset_baselines(&mut self) {
        self.filter.reset();
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }
}

/// Frame of the requested channels straight from `readings`, unfiltered.
pub fn snapshot_frame<'a, I>(readings: I, channels: &[Channel]) -> TelemetryFrame
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut frame = TelemetryFrame::new();
    for reading in readings {
        for channel in channels {
            if let Some(value) = reading.channel_value(*channel) {
                frame.insert(*channel, wire_value(value));
            }
        }
    }
    frame
}
