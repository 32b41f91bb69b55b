//! Completeness scoring of extracted reasoning.

use agent_primitives::{CompletenessAssessment, ReasoningComponent, ReasoningRecord};
use tracing::debug;

use crate::ExtractionResult;
use crate::config::ScoringConfig;

const NO_OPTIONS_WARNING: &str = "no alternatives were documented";

/// Scores a record against the required-component rules.
#[derive(Debug, Clone)]
pub struct CompletenessScorer {
    config: ScoringConfig,
}

impl CompletenessScorer {
    /// Creates a scorer after validating thresholds and weights.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Configuration`](crate::ExtractionError::Configuration)
    /// when the configuration is rejected by [`ScoringConfig::validate`].
    pub fn new(config: ScoringConfig) -> ExtractionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Computes the assessment from the record's own fields.
    ///
    /// The score is the weighted fraction of satisfied required components;
    /// with default weights it is exactly `satisfied / 5`.
    #[must_use]
    pub fn score(&self, record: &ReasoningRecord) -> CompletenessAssessment {
        let mut satisfied = 0.0;
        let mut total = 0.0;
        let mut missing = Vec::new();

        for component in ReasoningComponent::REQUIRED {
            let weight = self.config.weight(component);
            total += weight;
            if self.satisfies(record, component) {
                satisfied += weight;
            } else {
                missing.push(component);
            }
        }

        let score = if total > 0.0 {
            (satisfied / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        if record.options().is_empty() {
            warnings.push(NO_OPTIONS_WARNING.to_owned());
        }

        CompletenessAssessment {
            score,
            valid: score >= self.config.validity_threshold,
            missing,
            warnings,
        }
    }

    /// Scores `record` and attaches the assessment to it.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Record`](crate::ExtractionError::Record) when
    /// the record was already scored.
    pub fn annotate(&self, record: &mut ReasoningRecord) -> ExtractionResult<CompletenessAssessment> {
        let assessment = self.score(record);
        record.attach_completeness(assessment.clone())?;
        debug!(
            record_id = %record.id(),
            score = assessment.score,
            missing = assessment.missing.len(),
            valid = assessment.valid,
            "completeness scored"
        );
        Ok(assessment)
    }

    fn satisfies(&self, record: &ReasoningRecord, component: ReasoningComponent) -> bool {
        match component {
            ReasoningComponent::Situation => {
                char_len(record.situation()) >= self.config.min_situation_length.max(1)
            }
            ReasoningComponent::QuantitativeAnalysis => !record.quantitative_analysis().is_empty(),
            ReasoningComponent::Rationale => {
                char_len(record.rationale()) >= self.config.min_rationale_length.max(1)
            }
            ReasoningComponent::Risks => record.risks().iter().any(|risk| !risk.trim().is_empty()),
            ReasoningComponent::SelectedAction => !record.selected_action().function().is_empty(),
            ReasoningComponent::Options => !record.options().is_empty(),
        }
    }
}

fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}
