//! Policy configuration schema, defaults, and validation.
//!
//! The wire shape uses camelCase keys:
//!
//! ```json
//! {
//!   "tradeLimits": {"singleTradeMax": "$100M", "reviewThreshold": 50000000, "autoApproveMax": "10M"},
//!   "blacklist": {"symbols": ["XYZ"], "actions": ["short_sell"]},
//!   "timingRestrictions": {"preEarningsDays": 1, "highVolatilityThreshold": 30}
//! }
//! ```
//!
//! Unknown keys are ignored and missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::magnitude::{deserialize_limit, format_amount};
use crate::{PolicyError, PolicyResult};

/// Complete policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Magnitude limits.
    pub trade_limits: TradeLimits,
    /// Denylisted identifiers.
    pub blacklist: Blacklist,
    /// Blackout windows and volatility limits.
    pub timing_restrictions: TimingRestrictions,
}

/// Magnitude thresholds, in currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TradeLimits {
    /// Hard maximum; anything above is blocked.
    #[serde(deserialize_with = "deserialize_limit")]
    pub single_trade_max: f64,
    /// Anything above requires human review.
    #[serde(deserialize_with = "deserialize_limit")]
    pub review_threshold: f64,
    /// Anything at or below may be auto-approved.
    #[serde(deserialize_with = "deserialize_limit")]
    pub auto_approve_max: f64,
}

impl Default for TradeLimits {
    fn default() -> Self {
        Self {
            single_trade_max: 100_000_000.0,
            review_threshold: 50_000_000.0,
            auto_approve_max: 10_000_000.0,
        }
    }
}

/// Symbols and action types that are never permitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blacklist {
    /// Restricted instrument symbols, matched case-insensitively.
    pub symbols: Vec<String>,
    /// Restricted action function names, matched exactly.
    pub actions: Vec<String>,
}

/// Timing restrictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingRestrictions {
    /// Days before a scheduled event during which actions need review.
    pub pre_earnings_days: u32,
    /// Volatility index above which actions need review.
    pub high_volatility_threshold: f64,
    /// Phrases in the situation or task that indicate an upcoming event.
    pub event_cues: Vec<String>,
}

impl Default for TimingRestrictions {
    fn default() -> Self {
        Self {
            pre_earnings_days: 1,
            high_volatility_threshold: 30.0,
            event_cues: ["earnings", "earnings call", "quarterly report", "pre-earnings"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl PolicyConfig {
    /// Parses and validates a JSON policy document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Configuration`] when the document is not valid
    /// JSON, a limit is unparseable, or [`PolicyConfig::validate`] fails.
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| PolicyError::configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that limits are finite, non-negative, and correctly ordered.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> PolicyResult<()> {
        let limits = &self.trade_limits;
        for (name, value) in [
            ("singleTradeMax", limits.single_trade_max),
            ("reviewThreshold", limits.review_threshold),
            ("autoApproveMax", limits.auto_approve_max),
            (
                "highVolatilityThreshold",
                self.timing_restrictions.high_volatility_threshold,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::configuration(format!(
                    "`{name}` must be a non-negative number, got {value}"
                )));
            }
        }

        if limits.auto_approve_max > limits.review_threshold {
            return Err(PolicyError::configuration(format!(
                "autoApproveMax {} exceeds reviewThreshold {}",
                format_amount(limits.auto_approve_max),
                format_amount(limits.review_threshold)
            )));
        }
        if limits.review_threshold > limits.single_trade_max {
            return Err(PolicyError::configuration(format!(
                "reviewThreshold {} exceeds singleTradeMax {}",
                format_amount(limits.review_threshold),
                format_amount(limits.single_trade_max)
            )));
        }
        Ok(())
    }
}
