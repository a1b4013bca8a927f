//! Configuration management for FieldLink.
//!
//! Every section falls back to the field defaults when omitted, so an empty
//! file yields [`Config::default_config`].

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub delivery: DeliveryConfig,
    pub location: LocationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Sleep between sampling cycles
    pub cycle_interval_ms: u64,
    /// Pause between two sensor reads within a cycle
    pub read_pause_ms: u64,
    /// Reconnect sweep (and status log) every N cycles
    pub reconnect_period: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Publish attempts per frame or fix
    pub max_attempts: u32,
    /// Mode argument passed with every frame publish
    pub frame_mode: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub enabled: bool,
    /// Wait after a missing fix or an exhausted delivery
    pub retry_interval_ms: u64,
    /// Wait after a successful report
    pub report_interval_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 1_000,
            read_pause_ms: 100,
            reconnect_period: 30,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            frame_mode: 1,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_interval_ms: 2_000,
            report_interval_secs: 1_800,
        }
    }
}

impl SamplingConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn read_pause(&self) -> Duration {
        Duration::from_millis(self.read_pause_ms)
    }
}

impl LocationConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject values that would stall a loop or disable delivery entirely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling.cycle_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "sampling.cycle_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sampling.reconnect_period == 0 {
            return Err(ConfigError::Invalid {
                field: "sampling.reconnect_period",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.delivery.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "delivery.max_attempts",
                reason: "at least one publish attempt is required".to_string(),
            });
        }
        if self.location.retry_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "location.retry_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
