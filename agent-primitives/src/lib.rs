//! Core shared types for the reasoning governance gate.
//!
//! Everything that crosses a crate boundary lives here: the conversation and
//! proposed-action inputs, the [`ReasoningRecord`] that flows through the
//! pipeline, policy verdicts, and the review lifecycle vocabulary.

#![warn(missing_docs, clippy::pedantic)]

mod action;
mod error;
mod ids;
mod record;
mod review;
mod verdict;

/// Conversation input and the proposed action under evaluation.
pub use action::{ConversationMessage, FunctionCall, MessageRole, ProposedAction, ToolCall};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Unique identifier for reasoning records.
pub use ids::RecordId;
/// The unit of work carried through extraction, policy, and review.
pub use record::{
    CompletenessAssessment, QuantitativeAnalysis, ReasoningComponent, ReasoningRecord,
    ReasoningRecordBuilder,
};
/// Review lifecycle states and human decision payloads.
pub use review::{HumanDecision, HumanReview, ReviewPriority, ReviewState, ReviewTicket};
/// Policy verdict representations.
pub use verdict::{PolicyCheck, PolicyDecision, PolicyRuleKind, PolicyVerdict};
