//! TOML-based core configuration.
//!
//! Tunables for the time-driven parts of the service: reminder offsets,
//! the idle threshold and the eviction sweep cadence. A missing file or
//! missing keys fall back to the defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Generous caps; they exist to keep the duration arithmetic and the
// reminder-offset sign flip well inside range.
const MAX_DAYS: u64 = 10 * 365;
const MAX_HOURS: u64 = 24 * 365;
const MAX_REMINDER_DAYS: u64 = 365;

/// Core configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Days an empty calendar may stay inactive before eviction.
    #[serde(default = "default_idle_threshold_days")]
    pub idle_threshold_days: u64,
    /// Hours between two eviction sweeps.
    #[serde(default = "default_sweep_period_hours")]
    pub sweep_period_hours: u64,
    /// Days before a date at which the first reminder fires.
    #[serde(default = "default_first_reminder_days")]
    pub first_reminder_days: u64,
    /// Days before a date at which the second reminder fires.
    #[serde(default = "default_second_reminder_days")]
    pub second_reminder_days: u64,
}

// Default functions

fn default_idle_threshold_days() -> u64 {
    // Around six months.
    180
}
fn default_sweep_period_hours() -> u64 {
    24
}
fn default_first_reminder_days() -> u64 {
    7
}
fn default_second_reminder_days() -> u64 {
    1
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            idle_threshold_days: default_idle_threshold_days(),
            sweep_period_hours: default_sweep_period_hours(),
            first_reminder_days: default_first_reminder_days(),
            second_reminder_days: default_second_reminder_days(),
        }
    }
}

impl CoreConfig {
    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_period_hours == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_period_hours".into(),
                message: "must be at least 1".into(),
            });
        }
        let bounds = [
            ("idle_threshold_days", self.idle_threshold_days, MAX_DAYS),
            ("sweep_period_hours", self.sweep_period_hours, MAX_HOURS),
            ("first_reminder_days", self.first_reminder_days, MAX_REMINDER_DAYS),
            ("second_reminder_days", self.second_reminder_days, MAX_REMINDER_DAYS),
        ];
        for (key, value, max) in bounds {
            if value > max {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be at most {max}, got {value}"),
                });
            }
        }
        Ok(())
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_days.saturating_mul(24 * 60 * 60))
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_period_hours.saturating_mul(60 * 60))
    }
}
