//! Review timing configuration.

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{ReviewError, ReviewResult};

/// Longest accepted time-to-live: ten years.
const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Deadlines for queued reviews and the cadence of the expiry sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewConfig {
    /// Seconds an item may wait for a decision before it expires.
    pub ttl_seconds: u64,
    /// Seconds between background expiry sweeps.
    pub sweep_interval_seconds: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 24 * 60 * 60,
            sweep_interval_seconds: 60,
        }
    }
}

impl ReviewConfig {
    /// Returns the review time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        let seconds = self.ttl_seconds.min(MAX_TTL_SECONDS);
        Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX / 1_000))
    }

    /// Returns the sweep interval.
    #[must_use]
    pub const fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_interval_seconds)
    }

    /// Validates that both durations are positive and the ttl is bounded.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Configuration`] when a duration is zero or the
    /// ttl exceeds ten years.
    pub fn validate(&self) -> ReviewResult<()> {
        if self.ttl_seconds == 0 {
            return Err(ReviewError::Configuration(
                "review ttl must be greater than zero",
            ));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ReviewError::Configuration(
                "review ttl cannot exceed ten years",
            ));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(ReviewError::Configuration(
                "sweep interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_day() {
        let config = ReviewConfig::default();
        assert_eq!(config.ttl(), Duration::hours(24));
        config.validate().unwrap();
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = ReviewConfig {
            ttl_seconds: 0,
            ..ReviewConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReviewError::Configuration(_))
        ));
    }
}
