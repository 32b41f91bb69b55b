//! Error types for the audit subsystem.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by audit recorders.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Underlying I/O failure while writing or reading the journal file.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
    /// External audit backend rejected the event.
    #[error("audit backend failure: {reason}")]
    Backend {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl AuditError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
