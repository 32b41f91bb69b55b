//! Append-only audit trail for the reasoning governance lifecycle.
//!
//! Every extraction, scoring, verdict, and review transition is described by
//! an [`AuditEvent`] handed to an [`AuditRecorder`]. Recording is best effort:
//! callers log failures and carry on.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod event;
pub mod journal;
pub mod memory;

pub use error::{AuditError, AuditResult};
pub use event::{AuditEvent, AuditEventType};
pub use journal::{AuditRecorder, FileJournal, append_best_effort};
pub use memory::InMemoryRecorder;
