//! Immutable audit events.

use std::fmt::{self, Display, Formatter};

use agent_primitives::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of lifecycle step an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A reasoning record was extracted from a conversation.
    ReasoningExtracted,
    /// Completeness scoring attached an assessment.
    CompletenessScored,
    /// The policy engine attached a verdict.
    PolicyEvaluated,
    /// The record entered the review queue.
    ReviewEnqueued,
    /// A reviewer claimed the record.
    ReviewClaimed,
    /// A reviewer submitted a decision.
    ReviewCompleted,
    /// The review deadline passed without a decision.
    ReviewExpired,
    /// The record became read-only without human review.
    RecordFinalized,
}

impl AuditEventType {
    /// Returns the snake-case label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReasoningExtracted => "reasoning_extracted",
            Self::CompletenessScored => "completeness_scored",
            Self::PolicyEvaluated => "policy_evaluated",
            Self::ReviewEnqueued => "review_enqueued",
            Self::ReviewClaimed => "review_claimed",
            Self::ReviewCompleted => "review_completed",
            Self::ReviewExpired => "review_expired",
            Self::RecordFinalized => "record_finalized",
        }
    }
}

impl Display for AuditEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    event_type: AuditEventType,
    record_id: RecordId,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    payload: Value,
}

impl AuditEvent {
    /// Creates an event timestamped now.
    #[must_use]
    pub fn new(event_type: AuditEventType, record_id: RecordId, payload: Value) -> Self {
        Self::at(event_type, record_id, payload, Utc::now())
    }

    /// Creates an event with an explicit timestamp.
    #[must_use]
    pub fn at(
        event_type: AuditEventType,
        record_id: RecordId,
        payload: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            record_id,
            timestamp,
            payload,
        }
    }

    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> AuditEventType {
        self.event_type
    }

    /// Returns the record the event refers to.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    /// Returns when the event happened.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the event payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
