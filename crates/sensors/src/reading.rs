//! Sensor reading payloads

use crate::kind::SensorKind;
use fieldlink_core::{Channel, ChannelValue};
use serde::{Deserialize, Serialize};

/// Three-axis vector in SI units.
pub type Vector3 = [f64; 3];

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Create a color from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = f64::from(self.r) - f64::from(other.r);
        let dg = f64::from(self.g) - f64::from(other.g);
        let db = f64::from(self.b) - f64::from(other.b);
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// One immutable sample from a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reading {
    /// Humidity sensor sample
    TempHumidity {
        /// °C
        temperature: f64,
        /// %RH
        humidity: f64,
    },
    /// Barometer sample
    PressureTemp {
        /// hPa
        pressure: f64,
        /// °C
        temperature: f64,
    },
    /// Color sensor sample
    Color(Rgb),
    /// Inertial sample
    Motion {
        /// m/s²
        accel: Vector3,
        /// rad/s
        gyro: Vector3,
    },
}

impl Reading {
    /// Sensor kind that produces this payload shape.
    pub fn kind(&self) -> SensorKind {
        match self {
            Reading::TempHumidity { .. } => SensorKind::TempHumidity,
            Reading::PressureTemp { .. } => SensorKind::PressureTemp,
            Reading::Color(_) => SensorKind::Color,
            Reading::Motion { .. } => SensorKind::Motion,
        }
    }

    /// Raw (unrounded) value of one of this reading's channels.
    pub fn channel_value(&self, channel: Channel) -> Option<ChannelValue> {
        match (self, channel) {
            (Reading::TempHumidity { temperature, .. }, Channel::Temperature) => {
                Some(ChannelValue::Scalar(*temperature))
            }
            (Reading::TempHumidity { humidity, .. }, Channel::Humidity) => {
                Some(ChannelValue::Scalar(*humidity))
            }
            (Reading::PressureTemp { temperature, .. }, Channel::PressureTemperature) => {
                Some(ChannelValue::Scalar(*temperature))
            }
            (Reading::PressureTemp { pressure, .. }, Channel::Pressure) => {
                Some(ChannelValue::Scalar(*pressure))
            }
            (Reading::Color(rgb), Channel::Color) => Some(ChannelValue::Rgb([rgb.r, rgb.g, rgb.b])),
            (Reading::Motion { gyro, .. }, Channel::Gyro) => Some(ChannelValue::Axes(*gyro)),
            (Reading::Motion { accel, .. }, Channel::Accel) => Some(ChannelValue::Axes(*accel)),
            _ => None,
        }
    }

    /// Whether every measured value is a finite number.
    pub fn is_finite(&self) -> bool {
        match self {
            Reading::TempHumidity {
                temperature,
                humidity,
            } => temperature.is_finite() && humidity.is_finite(),
            Reading::PressureTemp {
                pressure,
                temperature,
            } => pressure.is_finite() && temperature.is_finite(),
            Reading::Color(_) => true,
            Reading::Motion { accel, gyro } => accel.iter().chain(gyro).all(|axis| axis.is_finite()),
        }
    }
}
