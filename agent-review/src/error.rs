//! Error types for the review workflow and record store.

use agent_primitives::{PolicyDecision, RecordId, ReviewState};
use thiserror::Error;

use crate::state::ReviewEvent;

/// Errors emitted by [`RecordStore`](crate::RecordStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same identifier was already saved.
    #[error("record {record_id} already exists")]
    Duplicate {
        /// Identifier of the conflicting record.
        record_id: RecordId,
    },
    /// No record exists with the given identifier.
    #[error("record {record_id} not found")]
    NotFound {
        /// Identifier that was looked up.
        record_id: RecordId,
    },
    /// A conditional update found the record in an unexpected review state.
    #[error("record {record_id} is {actual}, expected {expected}")]
    Conflict {
        /// Identifier of the record.
        record_id: RecordId,
        /// State the caller read before updating.
        expected: ReviewState,
        /// State found in the store.
        actual: ReviewState,
    },
    /// Backend-specific failure.
    #[error("record store failure: {reason}")]
    Backend {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl StoreError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors emitted by the review workflow.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The record already reached a terminal review state.
    #[error("record {record_id} was already decided ({state})")]
    StaleReview {
        /// Identifier of the record.
        record_id: RecordId,
        /// Terminal state the record is in.
        state: ReviewState,
    },
    /// The event is not permitted from the record's current state.
    #[error("invalid review transition from {from} via {event:?} for record {record_id}")]
    InvalidTransition {
        /// Identifier of the record.
        record_id: RecordId,
        /// State prior to the attempted transition.
        from: ReviewState,
        /// Event that triggered the failure.
        event: ReviewEvent,
    },
    /// Only `review_required` verdicts may enter the queue.
    #[error("record {record_id} does not require review (verdict: {decision:?})")]
    ReviewNotRequired {
        /// Identifier of the record.
        record_id: RecordId,
        /// Verdict decision, if one was attached.
        decision: Option<PolicyDecision>,
    },
    /// No record exists with the given identifier.
    #[error("record {record_id} not found")]
    NotFound {
        /// Identifier that was looked up.
        record_id: RecordId,
    },
    /// The reviewer's submission failed validation.
    #[error("invalid review submission: {0}")]
    InvalidSubmission(&'static str),
    /// Review configuration failed validation.
    #[error("invalid review configuration: {0}")]
    Configuration(&'static str),
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The record rejected a write-once update.
    #[error(transparent)]
    Record(#[from] agent_primitives::Error),
}

/// Result alias for review workflow operations.
pub type ReviewResult<T> = Result<T, ReviewError>;
