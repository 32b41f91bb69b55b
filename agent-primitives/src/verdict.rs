//! Policy verdict types attached to reasoning records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome category of a policy evaluation.
///
/// Variants are ordered by restrictiveness, so `max` yields the most
/// restrictive decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Action may proceed without human involvement.
    AutoApproved,
    /// Action must wait for a human reviewer.
    ReviewRequired,
    /// Action is rejected outright.
    Blocked,
}

impl PolicyDecision {
    /// Returns the more restrictive of the two decisions.
    #[must_use]
    pub fn most_restrictive(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns the snake-case label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoApproved => "auto_approved",
            Self::ReviewRequired => "review_required",
            Self::Blocked => "blocked",
        }
    }
}

/// Individual governance rule that contributed to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRuleKind {
    /// Hard maximum on the action magnitude.
    TradeSizeLimit,
    /// Magnitude above the review threshold.
    HighValueReview,
    /// Magnitude above the auto-approve ceiling.
    AutoApproveCeiling,
    /// Denylisted symbol or action type.
    Blacklist,
    /// Blackout windows and volatility restrictions.
    Timing,
    /// Reasoning completeness below the validity threshold.
    Completeness,
}

/// Result of a single rule check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    /// Rule that produced the check.
    pub rule: PolicyRuleKind,
    /// Whether the rule passed without raising a finding.
    pub passed: bool,
    /// Decision candidate proposed by the rule, if it fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<PolicyDecision>,
    /// Operator-facing explanation.
    pub message: String,
}

/// Aggregated verdict produced by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    decision: PolicyDecision,
    #[serde(default)]
    violations: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    checks: Vec<PolicyCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    magnitude: Option<f64>,
    reasoning: String,
    evaluated_at: DateTime<Utc>,
}

impl PolicyVerdict {
    /// Assembles a verdict from evaluated rule checks.
    #[must_use]
    pub fn new(
        decision: PolicyDecision,
        violations: Vec<String>,
        warnings: Vec<String>,
        checks: Vec<PolicyCheck>,
        magnitude: Option<f64>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        let reasoning = summarize(decision, &violations, &warnings);
        Self {
            decision,
            violations,
            warnings,
            checks,
            magnitude,
            reasoning,
            evaluated_at,
        }
    }

    /// Returns the final decision.
    #[must_use]
    pub fn decision(&self) -> PolicyDecision {
        self.decision
    }

    /// Returns the violation messages.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Returns the warning messages.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Returns every rule check in evaluation order.
    #[must_use]
    pub fn checks(&self) -> &[PolicyCheck] {
        &self.checks
    }

    /// Returns the action magnitude the engine extracted, if any.
    #[must_use]
    pub fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }

    /// Returns the human-readable decision summary.
    #[must_use]
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Returns when the verdict was produced.
    #[must_use]
    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    /// Returns `true` when the given rule fired.
    #[must_use]
    pub fn fired(&self, rule: PolicyRuleKind) -> bool {
        self.checks
            .iter()
            .any(|check| check.rule == rule && !check.passed)
    }
}

fn summarize(decision: PolicyDecision, violations: &[String], warnings: &[String]) -> String {
    match decision {
        PolicyDecision::Blocked => {
            format!("Blocked by policy violations: {}", violations.join(", "))
        }
        PolicyDecision::ReviewRequired => {
            let reasons: Vec<&str> = violations
                .iter()
                .chain(warnings)
                .map(String::as_str)
                .collect();
            format!("Review required: {}", reasons.join(", "))
        }
        PolicyDecision::AutoApproved => "All policy checks passed.".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restrictiveness_ordering() {
        use PolicyDecision::{AutoApproved, Blocked, ReviewRequired};

        assert_eq!(AutoApproved.most_restrictive(ReviewRequired), ReviewRequired);
        assert_eq!(Blocked.most_restrictive(ReviewRequired), Blocked);
        assert_eq!(AutoApproved.most_restrictive(AutoApproved), AutoApproved);
    }

    #[test]
    fn reasoning_lists_findings() {
        let verdict = PolicyVerdict::new(
            PolicyDecision::ReviewRequired,
            Vec::new(),
            vec!["high value".into(), "earnings soon".into()],
            Vec::new(),
            Some(60_000_000.0),
            Utc::now(),
        );
        assert_eq!(verdict.reasoning(), "Review required: high value, earnings soon");
    }
}
