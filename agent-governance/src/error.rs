use agent_config::ConfigError;
use agent_policy::PolicyError;
use agent_reasoning::ExtractionError;
use agent_review::{ReviewError, StoreError};
use thiserror::Error;

/// Errors surfaced by the governance pipeline and governors.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Extraction or scoring failed, including a missing proposed action.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Policy construction or evaluation failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The review workflow rejected an operation.
    #[error(transparent)]
    Review(#[from] ReviewError),
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Input could not be turned into a proposed action.
    #[error(transparent)]
    Record(#[from] agent_primitives::Error),
    /// A record's attached assessment or verdict disagrees with a fresh
    /// evaluation of its own fields.
    #[error("record {record_id} failed integrity check: {reason}")]
    Integrity {
        /// Identifier of the offending record.
        record_id: String,
        /// Which attachment disagreed.
        reason: String,
    },
    /// A remote governance backend failed or answered inconsistently.
    #[error("remote governor failure: {reason}")]
    Remote {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl GovernanceError {
    /// Helper to construct a remote failure.
    #[must_use]
    pub fn remote(reason: impl Into<String>) -> Self {
        Self::Remote {
            reason: reason.into(),
        }
    }
}

/// Convenience alias for governance results.
pub type GovernanceResult<T> = Result<T, GovernanceError>;
