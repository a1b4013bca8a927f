//! Raw register value conversions shared by the drivers.

use crate::reading::{Rgb, Vector3};

/// Accelerometer sensitivity at ±2 g full scale (LSB/g).
pub const ACCEL_LSB_PER_G: f64 = 16384.0;
/// Gravity used by the firmware for g → m/s².
pub const STANDARD_GRAVITY: f64 = 9.8;
/// Gyroscope sensitivity at ±1000 dps full scale (LSB/dps).
pub const GYRO_LSB_PER_DPS: f64 = 32.8;
/// Degrees to radians, at the precision the firmware uses.
pub const DEG_TO_RAD: f64 = 0.0174533;

/// Raw accelerometer ADC counts to m/s².
pub fn accel_from_raw(raw: [i16; 3]) -> Vector3 {
    raw.map(|axis| f64::from(axis) / ACCEL_LSB_PER_G * STANDARD_GRAVITY)
}

/// Raw gyroscope ADC counts to rad/s.
pub fn gyro_from_raw(raw: [i16; 3]) -> Vector3 {
    raw.map(|axis| f64::from(axis) / GYRO_LSB_PER_DPS * DEG_TO_RAD)
}

/// Split a packed `0xRRGGBB` value.
pub fn unpack_rgb888(packed: u32) -> Rgb {
    Rgb::new(
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    )
}

/// Pack a color as `0xRRGGBB`.
pub fn pack_rgb888(rgb: Rgb) -> u32 {
    (u32::from(rgb.r) << 16) | (u32::from(rgb.g) << 8) | u32::from(rgb.b)
}
