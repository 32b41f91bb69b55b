//! The reasoning record carried through extraction, policy, and review.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::review::{HumanDecision, HumanReview, ReviewState, ReviewTicket};
use crate::verdict::{PolicyDecision, PolicyVerdict};
use crate::{Error, ProposedAction, RecordId, Result};

/// Numbers pulled out of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeAnalysis {
    /// Monetary amounts in order of appearance.
    #[serde(default)]
    pub amounts: Vec<String>,
    /// Percentages in order of appearance.
    #[serde(default)]
    pub percentages: Vec<String>,
    /// Named metrics keyed by normalised label.
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
}

impl QuantitativeAnalysis {
    /// Returns `true` when no amount, percentage, or metric was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty() && self.percentages.is_empty() && self.metrics.is_empty()
    }
}

/// Named parts of a reasoning record that completeness scoring inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningComponent {
    /// Description of the current state.
    Situation,
    /// Amounts, percentages, and metrics.
    QuantitativeAnalysis,
    /// Why the action was chosen.
    Rationale,
    /// Identified risks.
    Risks,
    /// The proposed action.
    SelectedAction,
    /// Alternatives considered. Never required.
    Options,
}

impl ReasoningComponent {
    /// Components that count towards the completeness score.
    pub const REQUIRED: [Self; 5] = [
        Self::Situation,
        Self::QuantitativeAnalysis,
        Self::Rationale,
        Self::Risks,
        Self::SelectedAction,
    ];

    /// Returns the snake-case component name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Situation => "situation",
            Self::QuantitativeAnalysis => "quantitative_analysis",
            Self::Rationale => "rationale",
            Self::Risks => "risks",
            Self::SelectedAction => "selected_action",
            Self::Options => "options",
        }
    }
}

impl Display for ReasoningComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of completeness scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessAssessment {
    /// Weighted fraction of satisfied required components, in `[0, 1]`.
    pub score: f64,
    /// Required components that were not satisfied.
    pub missing: Vec<ReasoningComponent>,
    /// Whether the score meets the validity threshold.
    pub valid: bool,
    /// Display-only notes, e.g. undocumented alternatives.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Structured extraction of an agent's decision reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningRecord {
    record_id: RecordId,
    created_at: DateTime<Utc>,
    agent_id: String,
    agent_role: String,
    task: String,
    situation: String,
    rationale: String,
    quantitative_analysis: QuantitativeAnalysis,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    risks: Vec<String>,
    selected_action: ProposedAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completeness: Option<CompletenessAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy_verdict: Option<PolicyVerdict>,
    #[serde(default)]
    review_state: ReviewState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    review_ticket: Option<ReviewTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    human_review: Option<HumanReview>,
}

impl ReasoningRecord {
    /// Creates a builder for a record proposing `selected_action`.
    #[must_use]
    pub fn builder(selected_action: ProposedAction) -> ReasoningRecordBuilder {
        ReasoningRecordBuilder {
            record_id: RecordId::generate(),
            created_at: Utc::now(),
            agent_id: String::new(),
            agent_role: String::new(),
            task: String::new(),
            situation: String::new(),
            rationale: String::new(),
            quantitative_analysis: QuantitativeAnalysis::default(),
            options: Vec::new(),
            risks: Vec::new(),
            selected_action,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.record_id
    }

    /// Returns when the record was extracted.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the producing agent's identifier.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Returns the producing agent's role.
    #[must_use]
    pub fn agent_role(&self) -> &str {
        &self.agent_role
    }

    /// Returns the task the agent was working on.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Returns the extracted situation text.
    #[must_use]
    pub fn situation(&self) -> &str {
        &self.situation
    }

    /// Returns the extracted rationale text.
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Returns the extracted quantitative analysis.
    #[must_use]
    pub fn quantitative_analysis(&self) -> &QuantitativeAnalysis {
        &self.quantitative_analysis
    }

    /// Returns the alternatives the agent considered.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Returns the identified risks.
    #[must_use]
    pub fn risks(&self) -> &[String] {
        &self.risks
    }

    /// Returns the proposed action.
    #[must_use]
    pub fn selected_action(&self) -> &ProposedAction {
        &self.selected_action
    }

    /// Returns the completeness assessment once scored.
    #[must_use]
    pub fn completeness(&self) -> Option<&CompletenessAssessment> {
        self.completeness.as_ref()
    }

    /// Returns the completeness score, or `0.0` before scoring.
    #[must_use]
    pub fn completeness_score(&self) -> f64 {
        self.completeness.as_ref().map_or(0.0, |c| c.score)
    }

    /// Returns the missing required components, empty before scoring.
    #[must_use]
    pub fn missing_components(&self) -> &[ReasoningComponent] {
        match &self.completeness {
            Some(assessment) => &assessment.missing,
            None => &[],
        }
    }

    /// Returns the policy verdict once evaluated.
    #[must_use]
    pub fn policy_verdict(&self) -> Option<&PolicyVerdict> {
        self.policy_verdict.as_ref()
    }

    /// Returns the current review state.
    #[must_use]
    pub fn review_state(&self) -> ReviewState {
        self.review_state
    }

    /// Returns review queue bookkeeping, if the record was queued.
    #[must_use]
    pub fn review_ticket(&self) -> Option<&ReviewTicket> {
        self.review_ticket.as_ref()
    }

    /// Returns the recorded human review, if any.
    #[must_use]
    pub fn human_review(&self) -> Option<&HumanReview> {
        self.human_review.as_ref()
    }

    /// Returns the human decision, [`HumanDecision::None`] when absent.
    #[must_use]
    pub fn human_decision(&self) -> HumanDecision {
        self.human_review
            .as_ref()
            .map_or(HumanDecision::None, |review| review.decision)
    }

    /// Returns `true` once the record is archival and read-only.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        if self.review_state.is_terminal() {
            return true;
        }
        matches!(
            self.policy_verdict.as_ref().map(PolicyVerdict::decision),
            Some(PolicyDecision::AutoApproved | PolicyDecision::Blocked)
        )
    }

    /// Attaches the completeness assessment. Write-once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadySet`] if the record was already scored.
    pub fn attach_completeness(&mut self, assessment: CompletenessAssessment) -> Result<()> {
        if self.completeness.is_some() {
            return Err(self.already_set("completeness"));
        }
        self.completeness = Some(assessment);
        Ok(())
    }

    /// Attaches the policy verdict. Write-once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadySet`] if a verdict is already attached.
    pub fn attach_verdict(&mut self, verdict: PolicyVerdict) -> Result<()> {
        if self.policy_verdict.is_some() {
            return Err(self.already_set("policy_verdict"));
        }
        self.policy_verdict = Some(verdict);
        Ok(())
    }

    /// Overwrites the review state. Transition validity is the caller's concern.
    pub fn set_review_state(&mut self, state: ReviewState) {
        self.review_state = state;
    }

    /// Replaces the review queue bookkeeping.
    pub fn set_review_ticket(&mut self, ticket: ReviewTicket) {
        self.review_ticket = Some(ticket);
    }

    /// Returns mutable access to the review queue bookkeeping.
    pub fn review_ticket_mut(&mut self) -> Option<&mut ReviewTicket> {
        self.review_ticket.as_mut()
    }

    /// Records the human decision. Write-once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadySet`] if a human decision was already recorded.
    pub fn record_human_review(&mut self, review: HumanReview) -> Result<()> {
        if self.human_review.is_some() {
            return Err(self.already_set("human_decision"));
        }
        self.human_review = Some(review);
        Ok(())
    }

    fn already_set(&self, field: &'static str) -> Error {
        Error::AlreadySet {
            record_id: self.record_id.to_string(),
            field,
        }
    }
}

/// Builder used by the extractor to assemble [`ReasoningRecord`] instances.
#[derive(Debug)]
pub struct ReasoningRecordBuilder {
    record_id: RecordId,
    created_at: DateTime<Utc>,
    agent_id: String,
    agent_role: String,
    task: String,
    situation: String,
    rationale: String,
    quantitative_analysis: QuantitativeAnalysis,
    options: Vec<String>,
    risks: Vec<String>,
    selected_action: ProposedAction,
}

impl ReasoningRecordBuilder {
    /// Overrides the record identifier.
    #[must_use]
    pub fn id(mut self, id: RecordId) -> Self {
        self.record_id = id;
        self
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets agent provenance.
    #[must_use]
    pub fn provenance(
        mut self,
        agent_id: impl Into<String>,
        agent_role: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        self.agent_id = agent_id.into();
        self.agent_role = agent_role.into();
        self.task = task.into();
        self
    }

    /// Sets the situation text.
    #[must_use]
    pub fn situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = situation.into();
        self
    }

    /// Sets the rationale text.
    #[must_use]
    pub fn rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Sets the quantitative analysis.
    #[must_use]
    pub fn quantitative_analysis(mut self, analysis: QuantitativeAnalysis) -> Self {
        self.quantitative_analysis = analysis;
        self
    }

    /// Sets the considered alternatives.
    #[must_use]
    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Sets the identified risks.
    #[must_use]
    pub fn risks(mut self, risks: Vec<String>) -> Self {
        self.risks = risks;
        self
    }

    /// Finalises the builder and produces the record.
    #[must_use]
    pub fn build(self) -> ReasoningRecord {
        ReasoningRecord {
            record_id: self.record_id,
            created_at: self.created_at,
            agent_id: self.agent_id,
            agent_role: self.agent_role,
            task: self.task,
            situation: self.situation,
            rationale: self.rationale,
            quantitative_analysis: self.quantitative_analysis,
            options: self.options,
            risks: self.risks,
            selected_action: self.selected_action,
            completeness: None,
            policy_verdict: None,
            review_state: ReviewState::NotRequired,
            review_ticket: None,
            human_review: None,
        }
    }
}
