//! Error types for the extraction subsystem.

use thiserror::Error;

/// Errors emitted while extracting or scoring reasoning.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The caller supplied unusable input, e.g. no proposed action.
    #[error("invalid extraction input: {0}")]
    InvalidInput(&'static str),
    /// Extraction or scoring configuration failed validation.
    #[error("invalid extraction configuration: {reason}")]
    Configuration {
        /// Human-readable reason describing the failure.
        reason: String,
    },
    /// A configured pattern did not compile.
    #[error("invalid extraction pattern: {source}")]
    Pattern {
        /// Source [`regex::Error`].
        #[from]
        source: regex::Error,
    },
    /// The record rejected an update.
    #[error(transparent)]
    Record(#[from] agent_primitives::Error),
}

impl ExtractionError {
    /// Helper to construct configuration errors from string-like values.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result type alias for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;
