//! Rule-based policy engine over reasoning records.

use std::collections::BTreeSet;

use agent_primitives::{
    PolicyDecision, PolicyRuleKind, PolicyVerdict, ProposedAction, ReasoningRecord,
};
use chrono::Duration;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PolicyConfig;
use crate::contracts::EvaluationContext;
use crate::decision::Findings;
use crate::magnitude::{Magnitude, action_magnitude, format_amount};
use crate::{PolicyError, PolicyResult};

/// Parameter keys that may carry an instrument symbol.
const SYMBOL_KEYS: [&str; 2] = ["symbol", "ticker"];

/// Evaluates records against a validated [`PolicyConfig`].
///
/// Every rule category runs on every record so violations and warnings can
/// co-occur; the decision is the most restrictive candidate.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    config: PolicyConfig,
    blocked_symbols: BTreeSet<String>,
    blocked_actions: BTreeSet<String>,
    event_cues: Vec<String>,
}

impl PolicyEngine {
    /// Creates an engine after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Configuration`] when the limits are inconsistent.
    pub fn new(config: PolicyConfig) -> PolicyResult<Self> {
        config.validate()?;
        let blocked_symbols = config
            .blacklist
            .symbols
            .iter()
            .map(|symbol| symbol.trim().to_uppercase())
            .filter(|symbol| !symbol.is_empty())
            .collect();
        let blocked_actions = config
            .blacklist
            .actions
            .iter()
            .map(|action| action.trim().to_owned())
            .filter(|action| !action.is_empty())
            .collect();
        let event_cues = config
            .timing_restrictions
            .event_cues
            .iter()
            .map(|cue| cue.trim().to_lowercase())
            .filter(|cue| !cue.is_empty())
            .collect();

        Ok(Self {
            config,
            blocked_symbols,
            blocked_actions,
            event_cues,
        })
    }

    /// Parses a JSON policy document and builds an engine from it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Configuration`] for malformed documents.
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        Self::new(PolicyConfig::from_json(json)?)
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Evaluates `record` without modifying it.
    #[must_use]
    pub fn evaluate(&self, record: &ReasoningRecord, ctx: &EvaluationContext) -> PolicyVerdict {
        let action = record.selected_action();
        let magnitude = action_magnitude(action.parameters());
        let mut findings = Findings::default();

        self.check_magnitude(record, &magnitude, &mut findings);
        self.check_blacklist(action, &mut findings);
        self.check_timing(record, ctx, &mut findings);
        Self::check_completeness(record, &mut findings);

        let verdict = findings.into_verdict(magnitude.value(), ctx.now());
        info!(
            record_id = %record.id(),
            decision = verdict.decision().as_str(),
            violations = verdict.violations().len(),
            warnings = verdict.warnings().len(),
            "policy evaluated"
        );
        verdict
    }

    /// Evaluates `record` and attaches the verdict to it.
    ///
    /// The engine trusts the attached completeness assessment; callers
    /// holding records from outside the scorer must rescore them first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Unscored`] when no completeness assessment is
    /// attached, and [`PolicyError::Record`] when a verdict is already
    /// attached; the existing verdict is left untouched.
    pub fn apply(
        &self,
        record: &mut ReasoningRecord,
        ctx: &EvaluationContext,
    ) -> PolicyResult<PolicyVerdict> {
        if record.completeness().is_none() {
            return Err(PolicyError::Unscored {
                record_id: record.id().to_string(),
            });
        }
        if record.policy_verdict().is_some() {
            return Err(PolicyError::Record(agent_primitives::Error::AlreadySet {
                record_id: record.id().to_string(),
                field: "policy_verdict",
            }));
        }
        let verdict = self.evaluate(record, ctx);
        record.attach_verdict(verdict.clone())?;
        Ok(verdict)
    }

    fn check_magnitude(
        &self,
        record: &ReasoningRecord,
        magnitude: &Magnitude,
        findings: &mut Findings,
    ) {
        let limits = &self.config.trade_limits;
        let size = match magnitude {
            Magnitude::Known(size) => *size,
            Magnitude::Absent => {
                findings.pass(
                    PolicyRuleKind::TradeSizeLimit,
                    None,
                    "No trade size found (non-trading action)",
                );
                return;
            }
            Magnitude::Unreadable { key, raw } => {
                warn!(record_id = %record.id(), key = *key, raw = %raw, "unparseable trade size");
                findings.warning(
                    PolicyRuleKind::HighValueReview,
                    format!("Unparseable trade size `{raw}` in `{key}` requires human review"),
                );
                return;
            }
        };
        let amount = format_amount(size);

        if size > limits.single_trade_max {
            findings.violation(
                PolicyRuleKind::TradeSizeLimit,
                format!(
                    "Trade size {amount} exceeds maximum {}",
                    format_amount(limits.single_trade_max)
                ),
            );
        } else {
            findings.pass(
                PolicyRuleKind::TradeSizeLimit,
                None,
                format!("Trade size {amount} within limits"),
            );
        }

        if size > limits.review_threshold {
            findings.warning(
                PolicyRuleKind::HighValueReview,
                format!(
                    "High-value trade {amount} requires human review (threshold: {})",
                    format_amount(limits.review_threshold)
                ),
            );
        } else {
            findings.pass(
                PolicyRuleKind::HighValueReview,
                None,
                format!("Trade size {amount} below review threshold"),
            );
        }

        if size <= limits.auto_approve_max {
            findings.pass(
                PolicyRuleKind::AutoApproveCeiling,
                Some(PolicyDecision::AutoApproved),
                format!("Trade size {amount} within auto-approve ceiling"),
            );
        } else if size <= limits.review_threshold {
            findings.warning(
                PolicyRuleKind::AutoApproveCeiling,
                format!(
                    "Trade size {amount} exceeds auto-approve ceiling {}",
                    format_amount(limits.auto_approve_max)
                ),
            );
        }
    }

    fn check_blacklist(&self, action: &ProposedAction, findings: &mut Findings) {
        let symbol = SYMBOL_KEYS
            .iter()
            .filter_map(|key| action.parameters().get(*key))
            .filter_map(Value::as_str)
            .map(|symbol| symbol.trim().to_uppercase())
            .find(|symbol| self.blocked_symbols.contains(symbol));

        if let Some(symbol) = symbol {
            findings.violation(
                PolicyRuleKind::Blacklist,
                format!("Symbol {symbol} is blacklisted"),
            );
        } else if self.blocked_actions.contains(action.function()) {
            findings.violation(
                PolicyRuleKind::Blacklist,
                format!("Action {} is restricted", action.function()),
            );
        } else {
            findings.pass(PolicyRuleKind::Blacklist, None, "No blacklist violations");
        }
    }

    fn check_timing(
        &self,
        record: &ReasoningRecord,
        ctx: &EvaluationContext,
        findings: &mut Findings,
    ) {
        let timing = &self.config.timing_restrictions;
        let window = Duration::days(i64::from(timing.pre_earnings_days));
        let mut fired = false;

        let upcoming = ctx
            .event_dates()
            .iter()
            .filter(|date| **date >= ctx.now() && **date - ctx.now() <= window)
            .min();
        if let Some(date) = upcoming {
            fired = true;
            findings.warning(
                PolicyRuleKind::Timing,
                format!(
                    "Action falls within {} day(s) of a scheduled event on {}",
                    timing.pre_earnings_days,
                    date.format("%Y-%m-%d")
                ),
            );
        }

        let text = format!("{} {}", record.situation(), record.task()).to_lowercase();
        if self.event_cues.iter().any(|cue| text.contains(cue.as_str())) {
            fired = true;
            findings.warning(
                PolicyRuleKind::Timing,
                "Trade occurring before earnings announcement requires additional review",
            );
        }

        if let Some(index) = ctx
            .volatility_index()
            .filter(|index| *index > timing.high_volatility_threshold)
        {
            fired = true;
            findings.warning(
                PolicyRuleKind::Timing,
                format!(
                    "Volatility index {index:.1} above threshold {:.1}",
                    timing.high_volatility_threshold
                ),
            );
        }

        if !fired {
            findings.pass(PolicyRuleKind::Timing, None, "No timing concerns");
        }
    }

    fn check_completeness(record: &ReasoningRecord, findings: &mut Findings) {
        match record.completeness() {
            None => findings.warning(
                PolicyRuleKind::Completeness,
                "Reasoning completeness has not been assessed",
            ),
            Some(assessment) if !assessment.valid => {
                let missing: Vec<&str> = assessment
                    .missing
                    .iter()
                    .map(|component| component.as_str())
                    .collect();
                findings.warning(
                    PolicyRuleKind::Completeness,
                    format!(
                        "Reasoning completeness {:.1}% below the validity threshold (missing: {})",
                        assessment.score * 100.0,
                        missing.join(", ")
                    ),
                );
            }
            Some(assessment) => findings.pass(
                PolicyRuleKind::Completeness,
                None,
                format!(
                    "Reasoning completeness {:.1}% is acceptable",
                    assessment.score * 100.0
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::{CompletenessAssessment, ReasoningComponent};
    use chrono::Utc;
    use serde_json::{Map, json};

    fn record_with(params: Value, score: f64) -> ReasoningRecord {
        let params: Map<String, Value> = params.as_object().cloned().unwrap_or_default();
        let action = ProposedAction::new("execute_trade", params).unwrap();
        let mut record = ReasoningRecord::builder(action)
            .provenance("pm-1", "Portfolio_Manager", "rebalance technology exposure")
            .situation("The portfolio is 32% concentrated in a single name.")
            .build();
        record
            .attach_completeness(CompletenessAssessment {
                score,
                missing: if score < 1.0 {
                    vec![ReasoningComponent::Risks]
                } else {
                    Vec::new()
                },
                valid: score >= 0.6,
                warnings: Vec::new(),
            })
            .unwrap();
        record
    }

    fn engine() -> PolicyEngine {
        PolicyEngine::new(PolicyConfig::default()).unwrap()
    }

    #[test]
    fn above_hard_max_is_blocked() {
        let record = record_with(json!({"symbol": "AAPL", "amount": "$120M"}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::Blocked);
        assert!(verdict.violations()[0].contains("exceeds maximum $100,000,000"));
        assert_eq!(verdict.magnitude(), Some(120_000_000.0));
    }

    #[test]
    fn above_review_threshold_requires_review() {
        let record = record_with(json!({"amount": 60_000_000}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
        assert!(verdict.fired(PolicyRuleKind::HighValueReview));
        assert!(verdict.violations().is_empty());
    }

    #[test]
    fn between_ceiling_and_threshold_requires_review() {
        let record = record_with(json!({"amount": "$20M"}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
        assert!(verdict.fired(PolicyRuleKind::AutoApproveCeiling));
        assert!(!verdict.fired(PolicyRuleKind::HighValueReview));
    }

    #[test]
    fn small_complete_trade_is_auto_approved() {
        let record = record_with(json!({"amount": "$5M"}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::AutoApproved);
        assert!(verdict.warnings().is_empty());
    }

    #[test]
    fn limits_are_strict() {
        let record = record_with(json!({"amount": 10_000_000}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::AutoApproved);

        let record = record_with(json!({"amount": 100_000_000}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
    }

    #[test]
    fn blacklisted_symbol_and_action_block() {
        let engine = PolicyEngine::from_json(
            r#"{"blacklist": {"symbols": ["xyz"], "actions": ["short_sell"]}}"#,
        )
        .unwrap();

        let record = record_with(json!({"ticker": "XyZ", "amount": 1}), 1.0);
        let verdict = engine.evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::Blocked);
        assert_eq!(verdict.violations(), ["Symbol XYZ is blacklisted"]);

        let action = ProposedAction::new("short_sell", Map::new()).unwrap();
        let mut record = ReasoningRecord::builder(action).build();
        record
            .attach_completeness(CompletenessAssessment {
                score: 1.0,
                missing: Vec::new(),
                valid: true,
                warnings: Vec::new(),
            })
            .unwrap();
        let verdict = engine.evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.violations(), ["Action short_sell is restricted"]);
    }

    #[test]
    fn timing_rules_warn() {
        let now = Utc::now();
        let record = record_with(json!({"amount": 1}), 1.0);

        let ctx = EvaluationContext::at(now).with_event_date(now + Duration::hours(12));
        let verdict = engine().evaluate(&record, &ctx);
        assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
        assert!(verdict.fired(PolicyRuleKind::Timing));

        let ctx = EvaluationContext::at(now)
            .with_event_date(now + Duration::days(5))
            .with_volatility_index(12.0);
        assert_eq!(
            engine().evaluate(&record, &ctx).decision(),
            PolicyDecision::AutoApproved
        );

        let ctx = EvaluationContext::at(now).with_volatility_index(42.0);
        assert_eq!(
            engine().evaluate(&record, &ctx).decision(),
            PolicyDecision::ReviewRequired
        );
    }

    #[test]
    fn earnings_keyword_in_task_warns() {
        let action = ProposedAction::new("execute_trade", Map::new()).unwrap();
        let mut record = ReasoningRecord::builder(action)
            .provenance("pm-1", "Portfolio_Manager", "Trim ahead of the earnings call")
            .build();
        record
            .attach_completeness(CompletenessAssessment {
                score: 1.0,
                missing: Vec::new(),
                valid: true,
                warnings: Vec::new(),
            })
            .unwrap();
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert!(verdict.fired(PolicyRuleKind::Timing));
    }

    #[test]
    fn low_completeness_requires_review() {
        let record = record_with(json!({"amount": 1}), 0.4);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired);
        assert!(verdict.warnings()[0].contains("missing: risks"));
    }

    #[test]
    fn non_trading_action_contributes_no_candidate() {
        let record = record_with(json!({"note": "rebalance"}), 1.0);
        let verdict = engine().evaluate(&record, &EvaluationContext::default());
        assert_eq!(verdict.decision(), PolicyDecision::AutoApproved);
        assert_eq!(verdict.magnitude(), None);
    }

    #[test]
    fn decision_is_monotonic_in_magnitude() {
        let engine = engine();
        let mut previous = PolicyDecision::AutoApproved;
        for millions in [0, 5, 10, 11, 30, 50, 51, 80, 100, 101, 500] {
            let record = record_with(json!({"amount": f64::from(millions) * 1e6}), 1.0);
            let decision = engine
                .evaluate(&record, &EvaluationContext::default())
                .decision();
            assert!(decision >= previous, "{millions}M regressed to {decision:?}");
            if millions > 50 {
                assert_ne!(decision, PolicyDecision::AutoApproved);
            }
            if millions > 100 {
                assert_eq!(decision, PolicyDecision::Blocked);
            }
            previous = decision;
        }
    }

    #[test]
    fn oversized_trades_block_in_any_notation() {
        let engine = engine();
        for amount in [
            json!("USD 120M"),
            json!("120M USD"),
            json!("-$120M"),
            json!("$120 million"),
            json!(-120_000_000),
        ] {
            let record = record_with(json!({ "amount": amount.clone() }), 1.0);
            let verdict = engine.evaluate(&record, &EvaluationContext::default());
            assert_eq!(verdict.decision(), PolicyDecision::Blocked, "{amount}");
            assert_eq!(verdict.magnitude(), Some(120_000_000.0), "{amount}");
        }
    }

    #[test]
    fn unreadable_trade_size_requires_review() {
        for amount in [json!("a lot"), json!(null), json!({"notional": 5}), json!("1e9")] {
            let record = record_with(json!({ "amount": amount.clone() }), 1.0);
            let verdict = engine().evaluate(&record, &EvaluationContext::default());
            assert_eq!(verdict.decision(), PolicyDecision::ReviewRequired, "{amount}");
            assert_eq!(verdict.magnitude(), None);
            assert!(verdict.fired(PolicyRuleKind::HighValueReview));
            assert!(verdict.warnings()[0].starts_with("Unparseable trade size"));
        }
    }

    #[test]
    fn decision_is_monotonic_across_notations() {
        let engine = engine();
        let notations: [fn(u32) -> Value; 5] = [
            |m| json!(format!("${m}M")),
            |m| json!(format!("USD {m}M")),
            |m| json!(format!("{m} million USD")),
            |m| json!(format!("-${m}M")),
            |m| json!(-f64::from(m) * 1e6),
        ];
        for notation in notations {
            let mut previous = PolicyDecision::AutoApproved;
            for millions in [0, 5, 10, 11, 30, 50, 51, 80, 100, 101, 500] {
                let amount = notation(millions);
                let record = record_with(json!({ "amount": amount.clone() }), 1.0);
                let decision = engine
                    .evaluate(&record, &EvaluationContext::default())
                    .decision();
                assert!(decision >= previous, "{amount} regressed to {decision:?}");
                if millions > 50 {
                    assert_ne!(decision, PolicyDecision::AutoApproved, "{amount}");
                }
                if millions > 100 {
                    assert_eq!(decision, PolicyDecision::Blocked, "{amount}");
                }
                previous = decision;
            }
        }
    }

    #[test]
    fn apply_rejects_unscored_records() {
        let action = ProposedAction::new("execute_trade", Map::new()).unwrap();
        let mut record = ReasoningRecord::builder(action).build();
        let err = engine()
            .apply(&mut record, &EvaluationContext::default())
            .expect_err("unscored");
        assert!(matches!(err, PolicyError::Unscored { .. }));
        assert!(record.policy_verdict().is_none());
    }

    #[test]
    fn apply_attaches_once() {
        let mut record = record_with(json!({"amount": 1}), 1.0);
        let engine = engine();
        engine.apply(&mut record, &EvaluationContext::default()).unwrap();
        assert!(record.policy_verdict().is_some());
        assert!(engine.apply(&mut record, &EvaluationContext::default()).is_err());
    }
}
