//! Human review workflow for reasoning records that policy routed to a person.
//!
//! Records move through `queued → in_review → completed | expired`. The
//! [`RecordStore`] contract provides the per-record compare-and-set that
//! guarantees exactly one decision lands, and [`ExpirySweeper`] enforces the
//! time-to-live in the background.

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod error;
mod state;
mod store;
mod sweeper;
mod workflow;

pub use config::ReviewConfig;
pub use error::{ReviewError, ReviewResult, StoreError, StoreResult};
pub use state::{ReviewEvent, transition};
pub use store::{InMemoryStore, RecordQuery, RecordStore, SummaryStats};
pub use sweeper::ExpirySweeper;
pub use workflow::{ReviewSubmission, ReviewWorkflow, priority_for};
