//! Synchronization interval handling

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Interval between synchronization passes, in seconds
///
/// Fractional values are accepted. An interval of zero means the tool runs
/// exactly one pass and exits instead of looping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Interval(f64);

impl Interval {
    /// Create an interval from a number of seconds
    pub fn from_secs_f64(seconds: f64) -> ConfigResult<Self> {
        if !seconds.is_finite() {
            return Err(ConfigError::invalid_value("interval", "must be finite"));
        }
        if seconds < 0.0 {
            return Err(ConfigError::invalid_value(
                "interval",
                "must be non-negative",
            ));
        }
        Ok(Self(seconds))
    }

    /// Interval as seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    /// Interval as a `Duration`
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.0)
    }

    /// Whether this interval requests a single pass instead of a loop
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        let seconds: f64 = s.trim().parse().map_err(|_| {
            ConfigError::invalid_value("interval", "expected a number of seconds")
        })?;
        Self::from_secs_f64(seconds)
    }
}

impl TryFrom<f64> for Interval {
    type Error = ConfigError;

    fn try_from(seconds: f64) -> ConfigResult<Self> {
        Self::from_secs_f64(seconds)
    }
}

impl From<Interval> for f64 {
    fn from(interval: Interval) -> Self {
        interval.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
