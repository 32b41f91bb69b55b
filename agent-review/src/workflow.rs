//! Human review workflow over a [`RecordStore`].

use std::sync::Arc;

use agent_audit::{AuditEvent, AuditEventType, AuditRecorder, append_best_effort};
use agent_primitives::{
    HumanDecision, HumanReview, PolicyDecision, PolicyRuleKind, PolicyVerdict, RecordId,
    ReasoningRecord, ReviewPriority, ReviewState, ReviewTicket,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::config::ReviewConfig;
use crate::state::{ReviewEvent, transition};
use crate::store::RecordStore;
use crate::{ReviewError, ReviewResult, StoreError};

/// Attempts made to land a claim when concurrent updates keep winning.
const CLAIM_ATTEMPTS: usize = 3;

/// Decision payload submitted by the review UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    /// Record being decided.
    pub record_id: RecordId,
    /// Reviewer submitting the decision.
    pub reviewer_id: String,
    /// `approved`, `rejected`, or `modified`.
    pub decision: HumanDecision,
    /// Mandatory justification.
    pub rationale: String,
    /// Replacement parameters, required for `modified`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification: Option<Map<String, Value>>,
}

impl ReviewSubmission {
    /// Validates the payload independently of the record's state.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::InvalidSubmission`] when the reviewer or
    /// rationale is blank, the decision is `none`, or a `modified` decision
    /// carries no modification.
    pub fn validate(&self) -> ReviewResult<()> {
        if self.reviewer_id.trim().is_empty() {
            return Err(ReviewError::InvalidSubmission("reviewer id cannot be empty"));
        }
        if self.rationale.trim().is_empty() {
            return Err(ReviewError::InvalidSubmission("rationale cannot be empty"));
        }
        match (self.decision, &self.modification) {
            (HumanDecision::None, _) => Err(ReviewError::InvalidSubmission(
                "decision must be approved, rejected, or modified",
            )),
            (HumanDecision::Modified, None) => Err(ReviewError::InvalidSubmission(
                "modified decisions require a modification payload",
            )),
            _ => Ok(()),
        }
    }
}

/// Derives queue priority from the verdict that triggered review.
///
/// Any violation is urgent, a magnitude above the review threshold is high,
/// and everything else (completeness, timing, auto-approve ceiling) is normal.
#[must_use]
pub fn priority_for(verdict: &PolicyVerdict) -> ReviewPriority {
    if !verdict.violations().is_empty() {
        ReviewPriority::Urgent
    } else if verdict.fired(PolicyRuleKind::HighValueReview) {
        ReviewPriority::High
    } else {
        ReviewPriority::Normal
    }
}

/// Drives records through `queued → in_review → completed | expired`.
///
/// Per-record serialisation comes from [`RecordStore::update_if`]; the
/// workflow itself holds no locks.
pub struct ReviewWorkflow {
    store: Arc<dyn RecordStore>,
    recorder: Arc<dyn AuditRecorder>,
    config: ReviewConfig,
}

impl std::fmt::Debug for ReviewWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewWorkflow")
            .field("store", &"dyn RecordStore")
            .field("recorder", &"dyn AuditRecorder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReviewWorkflow {
    /// Creates a workflow after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Configuration`] for invalid durations.
    pub fn new(
        store: Arc<dyn RecordStore>,
        recorder: Arc<dyn AuditRecorder>,
        config: ReviewConfig,
    ) -> ReviewResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            recorder,
            config,
        })
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Returns the review configuration.
    #[must_use]
    pub fn config(&self) -> ReviewConfig {
        self.config
    }

    /// Loads a record.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] for unknown identifiers.
    pub async fn get(&self, record_id: RecordId) -> ReviewResult<ReasoningRecord> {
        self.store
            .get(record_id)
            .await?
            .ok_or(ReviewError::NotFound { record_id })
    }

    /// Queues a stored `review_required` record.
    ///
    /// # Errors
    ///
    /// See [`ReviewWorkflow::enqueue_at`].
    pub async fn enqueue(&self, record_id: RecordId) -> ReviewResult<ReasoningRecord> {
        self.enqueue_at(record_id, Utc::now()).await
    }

    /// Queues a stored `review_required` record as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::ReviewNotRequired`] unless the attached verdict
    /// is `review_required`, and [`ReviewError::InvalidTransition`] when the
    /// record was already queued.
    pub async fn enqueue_at(
        &self,
        record_id: RecordId,
        now: DateTime<Utc>,
    ) -> ReviewResult<ReasoningRecord> {
        let mut record = self.get(record_id).await?;
        let priority = match record.policy_verdict() {
            Some(verdict) if verdict.decision() == PolicyDecision::ReviewRequired => {
                priority_for(verdict)
            }
            other => {
                return Err(ReviewError::ReviewNotRequired {
                    record_id,
                    decision: other.map(PolicyVerdict::decision),
                });
            }
        };

        let from = record.review_state();
        let next = transition(record_id, from, ReviewEvent::Enqueue)?;
        let expires_at = now + self.config.ttl();
        record.set_review_state(next);
        record.set_review_ticket(ReviewTicket {
            priority,
            enqueued_at: now,
            expires_at,
            assigned_to: None,
            claimed_at: None,
        });
        self.commit(record.clone(), from).await?;

        info!(record_id = %record_id, ?priority, %expires_at, "review enqueued");
        self.audit(
            AuditEventType::ReviewEnqueued,
            record_id,
            json!({"priority": priority, "score": priority.score(), "expiresAt": expires_at}),
            now,
        )
        .await;
        Ok(record)
    }

    /// Claims a pending record for `reviewer_id`.
    ///
    /// # Errors
    ///
    /// See [`ReviewWorkflow::claim_at`].
    pub async fn claim(
        &self,
        record_id: RecordId,
        reviewer_id: &str,
    ) -> ReviewResult<ReasoningRecord> {
        self.claim_at(record_id, reviewer_id, Utc::now()).await
    }

    /// Claims a pending record as of `now`.
    ///
    /// Claims are advisory: a later claim replaces the displayed assignee and
    /// does not prevent anyone else from deciding.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::StaleReview`] for terminal or overdue records
    /// and [`ReviewError::InvalidTransition`] for records never queued.
    pub async fn claim_at(
        &self,
        record_id: RecordId,
        reviewer_id: &str,
        now: DateTime<Utc>,
    ) -> ReviewResult<ReasoningRecord> {
        if reviewer_id.trim().is_empty() {
            return Err(ReviewError::InvalidSubmission("reviewer id cannot be empty"));
        }

        for _ in 0..CLAIM_ATTEMPTS {
            let mut record = self.get(record_id).await?;
            let from = record.review_state();
            if is_overdue(&record, now) {
                let state = self.expire_record(record, now).await?;
                return Err(ReviewError::StaleReview { record_id, state });
            }

            let next = transition(record_id, from, ReviewEvent::Claim)?;
            record.set_review_state(next);
            if let Some(ticket) = record.review_ticket_mut() {
                ticket.assigned_to = Some(reviewer_id.to_owned());
                ticket.claimed_at = Some(now);
            }

            match self.store.update_if(record.clone(), from).await {
                Ok(()) => {
                    self.audit(
                        AuditEventType::ReviewClaimed,
                        record_id,
                        json!({"reviewerId": reviewer_id}),
                        now,
                    )
                    .await;
                    return Ok(record);
                }
                Err(StoreError::Conflict { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::backend(format!(
            "claim on record {record_id} lost {CLAIM_ATTEMPTS} concurrent updates"
        ))
        .into())
    }

    /// Records a human decision.
    ///
    /// # Errors
    ///
    /// See [`ReviewWorkflow::submit_at`].
    pub async fn submit(&self, submission: ReviewSubmission) -> ReviewResult<ReasoningRecord> {
        self.submit_at(submission, Utc::now()).await
    }

    /// Records a human decision as of `now`. Exactly one submission per record
    /// can succeed.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::StaleReview`] when the record is completed,
    /// expired, or past its deadline (which expires it),
    /// [`ReviewError::InvalidTransition`] when the record was not claimed, and
    /// [`ReviewError::InvalidSubmission`] for malformed payloads.
    pub async fn submit_at(
        &self,
        submission: ReviewSubmission,
        now: DateTime<Utc>,
    ) -> ReviewResult<ReasoningRecord> {
        let record_id = submission.record_id;
        let mut record = self.get(record_id).await?;
        let from = record.review_state();
        if from.is_terminal() {
            return Err(ReviewError::StaleReview {
                record_id,
                state: from,
            });
        }
        if is_overdue(&record, now) {
            let state = self.expire_record(record, now).await?;
            return Err(ReviewError::StaleReview { record_id, state });
        }

        submission.validate()?;
        let next = transition(record_id, from, ReviewEvent::Decide)?;

        let ReviewSubmission {
            reviewer_id,
            decision,
            rationale,
            modification,
            ..
        } = submission;
        record.record_human_review(HumanReview {
            decision,
            reviewer_id: reviewer_id.clone(),
            rationale,
            modification,
            decided_at: now,
        })?;
        record.set_review_state(next);
        self.commit(record.clone(), from).await?;

        info!(record_id = %record_id, ?decision, reviewer_id = %reviewer_id, "review completed");
        self.audit(
            AuditEventType::ReviewCompleted,
            record_id,
            json!({"decision": decision, "reviewerId": reviewer_id}),
            now,
        )
        .await;
        Ok(record)
    }

    /// Expires every pending record whose deadline has passed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn expire_overdue(&self) -> ReviewResult<Vec<RecordId>> {
        self.expire_overdue_at(Utc::now()).await
    }

    /// Expires every pending record overdue at `now`, returning their ids.
    ///
    /// Records decided concurrently are skipped.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn expire_overdue_at(&self, now: DateTime<Utc>) -> ReviewResult<Vec<RecordId>> {
        let mut expired = Vec::new();
        for record in self.store.pending_reviews(None).await? {
            if !is_overdue(&record, now) {
                continue;
            }
            let record_id = record.id();
            if self.expire_record(record, now).await? == ReviewState::Expired {
                expired.push(record_id);
            }
        }
        Ok(expired)
    }

    /// Lists pending reviews, highest priority then oldest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn pending(&self, assignee: Option<&str>) -> ReviewResult<Vec<ReasoningRecord>> {
        Ok(self.store.pending_reviews(assignee).await?)
    }

    /// Expires `record`, returning the state it ends up in. A concurrent
    /// update wins and its state is returned instead.
    async fn expire_record(
        &self,
        mut record: ReasoningRecord,
        now: DateTime<Utc>,
    ) -> ReviewResult<ReviewState> {
        let record_id = record.id();
        let from = record.review_state();
        let next = transition(record_id, from, ReviewEvent::Expire)?;
        record.set_review_state(next);

        match self.store.update_if(record, from).await {
            Ok(()) => {
                info!(record_id = %record_id, from = %from, "review expired");
                self.audit(
                    AuditEventType::ReviewExpired,
                    record_id,
                    json!({"from": from.to_string()}),
                    now,
                )
                .await;
                Ok(next)
            }
            Err(StoreError::Conflict { actual, .. }) => Ok(actual),
            Err(err) => Err(err.into()),
        }
    }

    async fn commit(&self, record: ReasoningRecord, expected: ReviewState) -> ReviewResult<()> {
        self.store
            .update_if(record, expected)
            .await
            .map_err(|err| match err {
                StoreError::Conflict {
                    record_id, actual, ..
                } if actual.is_terminal() => ReviewError::StaleReview {
                    record_id,
                    state: actual,
                },
                other => ReviewError::Store(other),
            })
    }

    async fn audit(
        &self,
        event_type: AuditEventType,
        record_id: RecordId,
        payload: Value,
        at: DateTime<Utc>,
    ) {
        append_best_effort(
            self.recorder.as_ref(),
            AuditEvent::at(event_type, record_id, payload, at),
        )
        .await;
    }
}

fn is_overdue(record: &ReasoningRecord, now: DateTime<Utc>) -> bool {
    record.review_state().is_pending()
        && record
            .review_ticket()
            .is_some_and(|ticket| ticket.is_overdue(now))
}
