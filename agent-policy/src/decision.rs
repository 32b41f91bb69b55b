//! Accumulation of rule findings into a verdict.

use agent_primitives::{PolicyCheck, PolicyDecision, PolicyRuleKind, PolicyVerdict};
use chrono::{DateTime, Utc};

/// Collects rule outcomes in evaluation order.
///
/// Every rule reports through one of the three recording methods; the final
/// decision is the most restrictive candidate seen, or
/// [`PolicyDecision::AutoApproved`] when no rule proposed one.
#[derive(Debug, Default)]
pub struct Findings {
    violations: Vec<String>,
    warnings: Vec<String>,
    checks: Vec<PolicyCheck>,
    decision: Option<PolicyDecision>,
}

impl Findings {
    /// Records a rule that passed, optionally proposing a candidate.
    pub fn pass(
        &mut self,
        rule: PolicyRuleKind,
        candidate: Option<PolicyDecision>,
        message: impl Into<String>,
    ) {
        self.record(rule, true, candidate, message.into());
    }

    /// Records a blocking violation.
    pub fn violation(&mut self, rule: PolicyRuleKind, message: impl Into<String>) {
        let message = message.into();
        self.violations.push(message.clone());
        self.record(rule, false, Some(PolicyDecision::Blocked), message);
    }

    /// Records a warning that requires human review.
    pub fn warning(&mut self, rule: PolicyRuleKind, message: impl Into<String>) {
        let message = message.into();
        self.warnings.push(message.clone());
        self.record(rule, false, Some(PolicyDecision::ReviewRequired), message);
    }

    /// Returns the decision implied by the findings so far.
    #[must_use]
    pub fn decision(&self) -> PolicyDecision {
        self.decision.unwrap_or(PolicyDecision::AutoApproved)
    }

    /// Finalises the verdict.
    #[must_use]
    pub fn into_verdict(self, magnitude: Option<f64>, evaluated_at: DateTime<Utc>) -> PolicyVerdict {
        PolicyVerdict::new(
            self.decision(),
            self.violations,
            self.warnings,
            self.checks,
            magnitude,
            evaluated_at,
        )
    }

    fn record(
        &mut self,
        rule: PolicyRuleKind,
        passed: bool,
        candidate: Option<PolicyDecision>,
        message: String,
    ) {
        if let Some(candidate) = candidate {
            self.decision = Some(
                self.decision
                    .map_or(candidate, |current| current.most_restrictive(candidate)),
            );
        }
        self.checks.push(PolicyCheck {
            rule,
            passed,
            candidate,
            message,
        });
    }
}
