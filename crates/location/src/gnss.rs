//! GNSS location from NMEA GGA sentences

use crate::source::LocationSource;
use fieldlink_core::{Clock, SystemClock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Talker + sentence id accepted as a fix.
pub const GGA_PREFIX: &str = "$GNGGA";

const MIN_GGA_FIELDS: usize = 15;

/// NMEA reads per fix when the receiver is still acquiring.
pub const GNSS_READ_ATTEMPTS: u32 = 10;
/// Pause between those reads.
pub const GNSS_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Why a sentence was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GgaError {
    #[error("Not a $GNGGA sentence")]
    WrongSentence,

    #[error("Expected at least 15 fields, got {0}")]
    TooFewFields(usize),

    #[error("No usable fix (quality {0:?})")]
    NoFix(String),

    #[error("Latitude field {0:?} out of range")]
    Latitude(String),

    #[error("Longitude field {0:?} out of range")]
    Longitude(String),
}

/// Position decoded from a valid GGA sentence, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GgaFix {
    pub latitude: f64,
    pub longitude: f64,
    /// 1 = GPS fix, 2 = differential
    pub quality: u8,
}

/// `ddmm.mmmm` / `dddmm.mmmm` to degrees; `None` when malformed.
fn degrees(field: &str, degree_digits: usize) -> Option<f64> {
    let whole: f64 = field.get(..degree_digits)?.parse().ok()?;
    let minutes: f64 = field.get(degree_digits..)?.parse().ok()?;
    let value = whole + minutes / 60.0;
    value.is_finite().then_some(value)
}

/// Decode and validate one GGA sentence.
pub fn parse_gga(sentence: &str) -> Result<GgaFix, GgaError> {
    let sentence = sentence.trim();
    if !sentence.starts_with(GGA_PREFIX) {
        return Err(GgaError::WrongSentence);
    }

    let fields: Vec<&str> = sentence.split(',').collect();
    if fields.len() < MIN_GGA_FIELDS {
        return Err(GgaError::TooFewFields(fields.len()));
    }

    let quality = match fields[6] {
        "1" => 1,
        "2" => 2,
        other => return Err(GgaError::NoFix(other.to_string())),
    };

    let latitude = degrees(fields[2], 2)
        .filter(|lat| (0.0..=90.0).contains(lat))
        .ok_or_else(|| GgaError::Latitude(fields[2].to_string()))?;
    let longitude = degrees(fields[4], 3)
        .filter(|lon| (0.0..=180.0).contains(lon))
        .ok_or_else(|| GgaError::Longitude(fields[4].to_string()))?;

    Ok(GgaFix {
        latitude,
        longitude,
        quality,
    })
}

pub fn is_valid_gga(sentence: &str) -> bool {
    parse_gga(sentence).is_ok()
}

/// First GGA line of a raw NMEA dump.
pub fn find_gga_line(nmea: &str) -> Option<&str> {
    nmea.lines().map(str::trim).find(|line| line.starts_with(GGA_PREFIX))
}

/// Receiver capability exposing raw NMEA output.
pub trait NmeaProvider: Send {
    /// Whether the receiver is powered and tracking.
    fn is_running(&mut self) -> bool;

    /// Latest NMEA block, possibly several sentences separated by newlines.
    fn read_nmea(&mut self) -> Option<String>;
}

/// [`LocationSource`] yielding validated GGA sentences.
pub struct GnssSource<P> {
    provider: P,
    attempts: u32,
    pause: Duration,
    clock: Arc<dyn Clock>,
}

impl<P: NmeaProvider> GnssSource<P> {
    /// Source that reads the receiver once per fix.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            attempts: 1,
            pause: Duration::ZERO,
            clock: Arc::new(SystemClock),
        }
    }

    /// Read up to `attempts` times per fix, pausing on `clock` between reads
    /// that gave no valid GGA sentence.
    pub fn with_retry(mut self, attempts: u32, pause: Duration, clock: Arc<dyn Clock>) -> Self {
        self.attempts = attempts.max(1);
        self.pause = pause;
        self.clock = clock;
        self
    }

    fn read_fix(&mut self) -> Option<String> {
        let nmea = self.provider.read_nmea()?;
        let line = find_gga_line(&nmea)?;
        match parse_gga(line) {
            Ok(fix) => {
                debug!(latitude = fix.latitude, longitude = fix.longitude, "GNSS fix");
                Some(line.to_string())
            }
            Err(e) => {
                debug!(error = %e, "Rejected GGA sentence");
                None
            }
        }
    }
}

impl<P> std::fmt::Debug for GnssSource<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GnssSource")
            .field("attempts", &self.attempts)
            .field("pause", &self.pause)
            .finish_non_exhaustive()
    }
}

impl<P: NmeaProvider> LocationSource for GnssSource<P> {
    fn get_fix(&mut self) -> Option<String> {
        if !self.provider.is_running() {
            error!("GNSS receiver is not running");
            return None;
        }

        for attempt in 1..=self.attempts {
            if let Some(fix) = self.read_fix() {
                return Some(fix);
            }
            if attempt < self.attempts {
                self.clock.sleep(self.pause);
            }
        }

        debug!(attempts = self.attempts, "No GNSS fix");
        None
    }

    fn name(&self) -> &'static str {
        "gnss"
    }
}
