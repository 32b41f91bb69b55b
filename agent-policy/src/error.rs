//! Error types for policy evaluation.

use thiserror::Error;

/// Errors surfaced by the policy engine.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy configuration could not be parsed or is inconsistent.
    #[error("invalid policy configuration: {reason}")]
    Configuration {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
    /// The record carries no completeness assessment to gate on.
    #[error("record {record_id} has not been scored for completeness")]
    Unscored {
        /// Identifier of the offending record.
        record_id: String,
    },
    /// The record rejected the verdict, e.g. because one is already attached.
    #[error(transparent)]
    Record(#[from] agent_primitives::Error),
}

impl PolicyError {
    /// Helper to construct configuration errors from string-like values.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
