//! Telemetry frame model
//!
//! A frame maps platform channel ids to values for a single sampling cycle.
//! Scalars serialize as numbers; 3-axis and color values serialize as
//! objects keyed `1`, `2`, `3`, which is the layout the platform's property
//! model expects.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Platform channel, one per physically meaningful quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Temperature from the humidity sensor (°C)
    Temperature,
    /// Relative humidity (%RH)
    Humidity,
    /// Temperature from the barometer (°C)
    PressureTemperature,
    /// Barometric pressure (hPa)
    Pressure,
    /// RGB color
    Color,
    /// Angular rate (rad/s)
    Gyro,
    /// Linear acceleration (m/s²)
    Accel,
}

impl Channel {
    /// Every channel, ordered by id.
    pub const ALL: [Channel; 7] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::PressureTemperature,
        Channel::Pressure,
        Channel::Color,
        Channel::Gyro,
        Channel::Accel,
    ];

    /// Wire id of the channel.
    pub const fn id(self) -> u8 {
        match self {
            Channel::Temperature => 3,
            Channel::Humidity => 4,
            Channel::PressureTemperature => 5,
            Channel::Pressure => 6,
            Channel::Color => 7,
            Channel::Gyro => 9,
            Channel::Accel => 10,
        }
    }

    /// Look a channel up by wire id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.id() == id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.id())
    }
}

/// Value carried by one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Scalar(f64),
    Axes([f64; 3]),
    Rgb([u8; 3]),
}

impl ChannelValue {
    /// Scalar rounded to two decimals, the precision the platform stores.
    pub fn rounded_scalar(value: f64) -> Self {
        ChannelValue::Scalar((value * 100.0).round() / 100.0)
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ChannelValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_axes(&self) -> Option<[f64; 3]> {
        match self {
            ChannelValue::Axes(axes) => Some(*axes),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<[u8; 3]> {
        match self {
            ChannelValue::Rgb(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

fn serialize_triple<S, T>(serializer: S, values: &[T; 3]) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut map = serializer.serialize_map(Some(3))?;
    for (index, value) in values.iter().enumerate() {
        map.serialize_entry(&(index as u8 + 1), value)?;
    }
    map.end()
}

impl Serialize for ChannelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChannelValue::Scalar(value) => serializer.serialize_f64(*value),
            ChannelValue::Axes(axes) => serialize_triple(serializer, axes),
            ChannelValue::Rgb(rgb) => serialize_triple(serializer, rgb),
        }
    }
}

/// One outbound batch of changed channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    values: BTreeMap<Channel, ChannelValue>,
}

impl TelemetryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a channel's value.
    pub fn insert(&mut self, channel: Channel, value: ChannelValue) {
        self.values.insert(channel, value);
    }

    pub fn get(&self, channel: Channel) -> Option<&ChannelValue> {
        self.values.get(&channel)
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.values.contains_key(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Channels present, ordered by id.
    pub fn channels(&self) -> Vec<Channel> {
        self.values.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &ChannelValue)> {
        self.values.iter().map(|(channel, value)| (*channel, value))
    }

    /// JSON encoding as sent to the platform.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for TelemetryFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (channel, value) in &self.values {
            map.serialize_entry(&channel.id(), value)?;
        }
        map.end()
    }
}
