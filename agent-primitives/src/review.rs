//! Review lifecycle vocabulary shared by the pipeline and the workflow.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State of a record in the human review lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// No review needed; the initial state.
    #[default]
    NotRequired,
    /// Waiting in the review queue.
    Queued,
    /// Claimed by at least one reviewer.
    InReview,
    /// A human decision was recorded.
    Completed,
    /// The time-to-live elapsed without a decision.
    Expired,
}

impl ReviewState {
    /// Returns `true` once no further review transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }

    /// Returns `true` while the item awaits a human decision.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Queued | Self::InReview)
    }
}

impl Display for ReviewState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotRequired => "not_required",
            Self::Queued => "queued",
            Self::InReview => "in_review",
            Self::Completed => "completed",
            Self::Expired => "expired",
        };
        f.write_str(label)
    }
}

/// Urgency assigned when a record enters the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPriority {
    /// Completeness-only or other soft triggers.
    Normal,
    /// Magnitude above the review threshold.
    High,
    /// At least one policy violation.
    Urgent,
}

impl ReviewPriority {
    /// Numeric score used to order the queue.
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::Urgent => 100,
            Self::High => 75,
            Self::Normal => 50,
        }
    }
}

/// Queue bookkeeping attached to a record once it enters review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTicket {
    /// Urgency of the review.
    pub priority: ReviewPriority,
    /// When the record was queued.
    pub enqueued_at: DateTime<Utc>,
    /// Deadline after which the item expires.
    pub expires_at: DateTime<Utc>,
    /// Reviewer who most recently claimed the item. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// When the item was most recently claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
}

impl ReviewTicket {
    /// Returns `true` when the deadline has passed at `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Decision a human reviewer can submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanDecision {
    /// No human decision recorded.
    #[default]
    None,
    /// Proposed action approved as-is.
    Approved,
    /// Proposed action rejected.
    Rejected,
    /// Proposed action approved with modifications.
    Modified,
}

/// Final human decision recorded on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanReview {
    /// The submitted decision.
    pub decision: HumanDecision,
    /// Reviewer who submitted it.
    pub reviewer_id: String,
    /// Mandatory justification text.
    pub rationale: String,
    /// Replacement parameters for `modified` decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification: Option<Map<String, Value>>,
    /// When the decision was recorded.
    pub decided_at: DateTime<Utc>,
}
