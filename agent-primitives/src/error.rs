//! Shared error definitions for governance primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the governance primitives.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided record identifier could not be parsed.
    #[error("invalid record id: {source}")]
    InvalidRecordId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// The nil UUID was offered as a record identifier.
    #[error("invalid record id: the nil uuid is reserved")]
    NilRecordId,

    /// A write-once field on a record was written a second time.
    #[error("record {record_id}: `{field}` is already set and cannot be changed")]
    AlreadySet {
        /// Identifier of the affected record.
        record_id: String,
        /// Name of the write-once field.
        field: &'static str,
    },

    /// The proposed action failed validation.
    #[error("invalid proposed action: {reason}")]
    InvalidAction {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
