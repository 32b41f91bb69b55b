//! Extraction, scoring, policy, and routing wired into one call.

use std::sync::Arc;

use agent_audit::{AuditEvent, AuditEventType, AuditRecorder, append_best_effort};
use agent_config::GovernanceConfig;
use agent_policy::{EvaluationContext, PolicyEngine};
use agent_primitives::{PolicyDecision, PolicyVerdict, ReasoningRecord};
use agent_reasoning::{CompletenessScorer, Extractor, MessageNormalizer};
use agent_review::{RecordStore, ReviewWorkflow};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{GovernanceError, GovernanceResult};
use crate::request::GovernanceRequest;

/// Runs `normalize → extract → score → evaluate` and routes the record to
/// the review queue or finalises it.
pub struct GovernancePipeline {
    extractor: Extractor,
    scorer: CompletenessScorer,
    engine: PolicyEngine,
    workflow: Arc<ReviewWorkflow>,
    recorder: Arc<dyn AuditRecorder>,
}

impl std::fmt::Debug for GovernancePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernancePipeline")
            .field("engine", &self.engine)
            .field("workflow", &self.workflow)
            .field("recorder", &"dyn AuditRecorder")
            .finish_non_exhaustive()
    }
}

impl GovernancePipeline {
    /// Builds every stage from `config`. Invalid configuration fails here,
    /// never per record.
    ///
    /// # Errors
    ///
    /// Returns the extraction, policy, or review configuration error of the
    /// first invalid section.
    pub fn new(
        config: GovernanceConfig,
        store: Arc<dyn RecordStore>,
        recorder: Arc<dyn AuditRecorder>,
    ) -> GovernanceResult<Self> {
        let GovernanceConfig {
            extraction,
            scoring,
            policy,
            review,
        } = config;

        let extractor = Extractor::new(extraction)?;
        let scorer = CompletenessScorer::new(scoring)?;
        let engine = PolicyEngine::new(policy)?;
        let workflow = Arc::new(ReviewWorkflow::new(store, Arc::clone(&recorder), review)?);

        Ok(Self {
            extractor,
            scorer,
            engine,
            workflow,
            recorder,
        })
    }

    /// Returns the review workflow records are routed to.
    #[must_use]
    pub fn workflow(&self) -> &Arc<ReviewWorkflow> {
        &self.workflow
    }

    /// Returns the policy engine.
    #[must_use]
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Extracts, scores, and evaluates without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidInput`](agent_reasoning::ExtractionError::InvalidInput)
    /// when the request carries no proposed action.
    pub fn evaluate(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord> {
        let action = request.action.as_ref();
        let conversation = MessageNormalizer::normalize(&request.messages, action);
        let mut record = self.extractor.extract(
            &request.agent_id,
            &request.agent_role,
            request.resolved_task(),
            &conversation,
            action,
        )?;
        self.scorer.annotate(&mut record)?;
        self.engine.apply(&mut record, ctx)?;
        Ok(record)
    }

    /// Persists an evaluated record, audits its stages, then queues it for
    /// review or finalises it according to its verdict.
    ///
    /// The attached completeness and verdict are recomputed from the record's
    /// own fields first; a record carrying values the pipeline would not have
    /// produced is refused before anything is stored or audited.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Integrity`] for unscored, unevaluated, or
    /// altered records, and propagates store and review failures. Audit
    /// failures are logged only.
    pub async fn commit(
        &self,
        record: ReasoningRecord,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord> {
        let decision = self.verify(&record, ctx)?;
        let now = ctx.now();
        let record_id = record.id();
        self.workflow.store().save(record.clone()).await?;

        for (event_type, payload) in stage_events(&record) {
            append_best_effort(
                self.recorder.as_ref(),
                AuditEvent::at(event_type, record_id, payload, now),
            )
            .await;
        }

        if decision == PolicyDecision::ReviewRequired {
            return Ok(self.workflow.enqueue_at(record_id, now).await?);
        }

        info!(
            record_id = %record_id,
            decision = decision.as_str(),
            "record finalized"
        );
        append_best_effort(
            self.recorder.as_ref(),
            AuditEvent::at(
                AuditEventType::RecordFinalized,
                record_id,
                json!({"decision": decision}),
                now,
            ),
        )
        .await;
        Ok(record)
    }

    /// Evaluates and commits in one call.
    ///
    /// # Errors
    ///
    /// See [`GovernancePipeline::evaluate`] and [`GovernancePipeline::commit`].
    pub async fn run(
        &self,
        request: &GovernanceRequest,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<ReasoningRecord> {
        let record = self.evaluate(request, ctx)?;
        self.commit(record, ctx).await
    }
}

impl GovernancePipeline {
    fn verify(
        &self,
        record: &ReasoningRecord,
        ctx: &EvaluationContext,
    ) -> GovernanceResult<PolicyDecision> {
        let integrity = |reason: &str| GovernanceError::Integrity {
            record_id: record.id().to_string(),
            reason: reason.to_owned(),
        };

        let attached = record
            .completeness()
            .ok_or_else(|| integrity("no completeness assessment"))?;
        if *attached != self.scorer.score(record) {
            warn!(record_id = %record.id(), "completeness does not match its fields");
            return Err(integrity("completeness does not match the record's fields"));
        }

        let decision = record
            .policy_verdict()
            .map(PolicyVerdict::decision)
            .ok_or_else(|| integrity("no policy verdict"))?;
        if decision != self.engine.evaluate(record, ctx).decision() {
            warn!(record_id = %record.id(), "verdict does not match policy");
            return Err(integrity("policy verdict does not match the configured policy"));
        }
        Ok(decision)
    }
}

fn stage_events(record: &ReasoningRecord) -> [(AuditEventType, Value); 3] {
    let analysis = record.quantitative_analysis();
    let extracted = json!({
        "agentId": record.agent_id(),
        "task": record.task(),
        "function": record.selected_action().function(),
        "situationChars": record.situation().chars().count(),
        "rationaleChars": record.rationale().chars().count(),
        "amounts": analysis.amounts.len(),
        "percentages": analysis.percentages.len(),
        "metrics": analysis.metrics.len(),
        "options": record.options().len(),
        "risks": record.risks().len(),
    });

    let scored = record.completeness().map_or(Value::Null, |assessment| {
        json!({
            "score": assessment.score,
            "missing": assessment.missing,
            "valid": assessment.valid,
            "warnings": assessment.warnings,
        })
    });

    let evaluated = record.policy_verdict().map_or(Value::Null, |verdict| {
        json!({
            "decision": verdict.decision(),
            "violations": verdict.violations(),
            "warnings": verdict.warnings(),
            "magnitude": verdict.magnitude(),
            "reasoning": verdict.reasoning(),
        })
    });

    [
        (AuditEventType::ReasoningExtracted, extracted),
        (AuditEventType::CompletenessScored, scored),
        (AuditEventType::PolicyEvaluated, evaluated),
    ]
}
