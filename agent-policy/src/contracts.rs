//! External inputs supplied alongside a record for policy evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Market and calendar context for a single evaluation.
///
/// The engine never looks up dates or market data itself; callers supply
/// whatever they know and the timing rules use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    now: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    event_dates: Vec<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volatility_index: Option<f64>,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl EvaluationContext {
    /// Creates a context evaluated at `now` with no event or market data.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            event_dates: Vec::new(),
            volatility_index: None,
        }
    }

    /// Adds a scheduled event, e.g. an earnings announcement.
    #[must_use]
    pub fn with_event_date(mut self, date: DateTime<Utc>) -> Self {
        self.event_dates.push(date);
        self
    }

    /// Sets the current volatility index reading.
    #[must_use]
    pub fn with_volatility_index(mut self, index: f64) -> Self {
        self.volatility_index = Some(index);
        self
    }

    /// Returns the evaluation instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the scheduled events.
    #[must_use]
    pub fn event_dates(&self) -> &[DateTime<Utc>] {
        &self.event_dates
    }

    /// Returns the volatility reading, if supplied.
    #[must_use]
    pub fn volatility_index(&self) -> Option<f64> {
        self.volatility_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn builder_accumulates_events() {
        let now = Utc::now();
        let ctx = EvaluationContext::at(now)
            .with_event_date(now + Duration::hours(6))
            .with_event_date(now + Duration::days(10))
            .with_volatility_index(22.5);

        assert_eq!(ctx.now(), now);
        assert_eq!(ctx.event_dates().len(), 2);
        assert_eq!(ctx.volatility_index(), Some(22.5));
    }
}
