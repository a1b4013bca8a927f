//! Sensor kinds

use fieldlink_core::Channel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of onboard sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Accelerometer + gyroscope (ICM20948 class)
    Motion,
    /// Temperature + humidity (SHTC3 class)
    TempHumidity,
    /// Pressure + temperature (LPS22HB class)
    PressureTemp,
    /// RGB color (TCS34725 class)
    Color,
}

impl SensorKind {
    /// Every kind, in sampling order.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Motion,
        SensorKind::TempHumidity,
        SensorKind::PressureTemp,
        SensorKind::Color,
    ];

    /// Name of the part fitted on the board.
    pub const fn part_name(self) -> &'static str {
        match self {
            SensorKind::Motion => "ICM20948",
            SensorKind::TempHumidity => "SHTC3",
            SensorKind::PressureTemp => "LPS22HB",
            SensorKind::Color => "TCS34725",
        }
    }

    /// Channels this sensor feeds.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            SensorKind::Motion => &[Channel::Gyro, Channel::Accel],
            SensorKind::TempHumidity => &[Channel::Temperature, Channel::Humidity],
            SensorKind::PressureTemp => &[Channel::PressureTemperature, Channel::Pressure],
            SensorKind::Color => &[Channel::Color],
        }
    }

    /// Sensor that owns `channel`.
    pub fn for_channel(channel: Channel) -> SensorKind {
        match channel {
            Channel::Gyro | Channel::Accel => SensorKind::Motion,
            Channel::Temperature | Channel::Humidity => SensorKind::TempHumidity,
            Channel::PressureTemperature | Channel::Pressure => SensorKind::PressureTemp,
            Channel::Color => SensorKind::Color,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.part_name())
    }
}
