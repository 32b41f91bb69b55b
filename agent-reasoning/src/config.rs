//! Tunable cue lexicons, thresholds, and scoring weights.
//!
//! Extraction rules are data: every cue list, span bound, match cap, and
//! quantity pattern lives here so it can be tuned without touching the
//! extraction strategies.

use std::collections::BTreeMap;

use agent_primitives::ReasoningComponent;
use serde::{Deserialize, Serialize};

use crate::{ExtractionError, ExtractionResult};

fn cues(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| (*word).to_owned()).collect()
}

/// Configuration for the [`Extractor`](crate::Extractor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Cues introducing a description of the current state.
    pub situation_cues: Vec<String>,
    /// Cues marking the start of the decision; situations must precede them.
    pub decision_cues: Vec<String>,
    /// Maximum characters captured for the situation.
    pub situation_window: usize,
    /// Minimum characters for a situation candidate to qualify.
    pub min_situation_span: usize,
    /// Causal cues introducing the rationale.
    pub rationale_cues: Vec<String>,
    /// Maximum characters captured for the rationale.
    pub rationale_window: usize,
    /// Minimum characters for a rationale candidate to qualify.
    pub min_rationale_span: usize,
    /// Cues marking a clause as a risk. Matched as word prefixes.
    pub risk_cues: Vec<String>,
    /// Minimum characters for a risk clause.
    pub min_risk_length: usize,
    /// Maximum number of risks kept.
    pub max_risks: usize,
    /// Cues introducing an inline alternative.
    pub option_cues: Vec<String>,
    /// Cues marking a line as the header of a list of alternatives.
    pub option_header_cues: Vec<String>,
    /// Minimum characters for an option entry.
    pub min_option_length: usize,
    /// Maximum number of options kept.
    pub max_options: usize,
    /// Regular expression matching monetary amounts.
    pub amount_pattern: String,
    /// Regular expression matching percentages.
    pub percentage_pattern: String,
    /// Regular expression matching a metric label preceding `:` or `=`.
    pub metric_label_pattern: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            situation_cues: cues(&[
                "current situation",
                "situation",
                "context",
                "currently",
                "as of",
                "portfolio",
            ]),
            decision_cues: cues(&[
                "i recommend",
                "recommendation",
                "i will",
                "we should",
                "decision",
                "proposed action",
                "therefore",
            ]),
            situation_window: 500,
            min_situation_span: 20,
            rationale_cues: cues(&[
                "because",
                "due to",
                "given that",
                "requires",
                "since",
                "rationale",
                "reason",
            ]),
            rationale_window: 400,
            min_rationale_span: 15,
            risk_cues: cues(&[
                "risk",
                "could result in",
                "may impact",
                "might impact",
                "concern",
                "downside",
                "caution",
            ]),
            min_risk_length: 10,
            max_risks: 10,
            option_cues: cues(&[
                "alternatively",
                "alternative",
                "could also",
                "another approach",
                "instead",
            ]),
            option_header_cues: cues(&["option", "alternative", "approach", "considered"]),
            min_option_length: 10,
            max_options: 5,
            amount_pattern: r"[$€£]\d+(?:,\d{3})*(?:\.\d+)?(?:[KMBT]\b)?".to_owned(),
            percentage_pattern: r"\d+(?:\.\d+)?%".to_owned(),
            metric_label_pattern: r"[A-Za-z][A-Za-z0-9 _/()\-]{0,40}?".to_owned(),
        }
    }
}

impl ExtractionConfig {
    /// Validates bounds that would otherwise make strategies degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Configuration`] when a window is zero or a
    /// cue list required by a strategy is empty.
    pub fn validate(&self) -> ExtractionResult<()> {
        if self.situation_window == 0 || self.rationale_window == 0 {
            return Err(ExtractionError::configuration(
                "capture windows must be greater than zero",
            ));
        }
        if self.situation_cues.is_empty() || self.rationale_cues.is_empty() {
            return Err(ExtractionError::configuration(
                "situation and rationale cue lists cannot be empty",
            ));
        }
        if self.risk_cues.is_empty() {
            return Err(ExtractionError::configuration("risk cue list cannot be empty"));
        }
        Ok(())
    }
}

/// Configuration for the [`CompletenessScorer`](crate::CompletenessScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Minimum situation length, in characters.
    pub min_situation_length: usize,
    /// Minimum rationale length, in characters.
    pub min_rationale_length: usize,
    /// Score at or above which reasoning counts as valid.
    pub validity_threshold: f64,
    /// Per-component weight overrides. Unlisted required components weigh `1.0`.
    pub weights: BTreeMap<ReasoningComponent, f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_situation_length: 50,
            min_rationale_length: 20,
            validity_threshold: 0.6,
            weights: BTreeMap::new(),
        }
    }
}

impl ScoringConfig {
    /// Returns the weight applied to `component`.
    #[must_use]
    pub fn weight(&self, component: ReasoningComponent) -> f64 {
        self.weights.get(&component).copied().unwrap_or(1.0)
    }

    /// Validates the threshold and weights.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Configuration`] when the threshold is
    /// outside `[0, 1]`, a weight is negative or non-finite, a weight targets
    /// an optional component, or all required weights are zero.
    pub fn validate(&self) -> ExtractionResult<()> {
        if !(0.0..=1.0).contains(&self.validity_threshold) {
            return Err(ExtractionError::configuration(format!(
                "validity threshold {} must be within [0, 1]",
                self.validity_threshold
            )));
        }
        for (component, weight) in &self.weights {
            if !ReasoningComponent::REQUIRED.contains(component) {
                return Err(ExtractionError::configuration(format!(
                    "`{component}` is optional and cannot carry a weight"
                )));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ExtractionError::configuration(format!(
                    "weight for `{component}` must be a non-negative number"
                )));
            }
        }
        let total: f64 = ReasoningComponent::REQUIRED
            .iter()
            .map(|component| self.weight(*component))
            .sum();
        if total <= 0.0 {
            return Err(ExtractionError::configuration(
                "required component weights cannot all be zero",
            ));
        }
        Ok(())
    }
}
