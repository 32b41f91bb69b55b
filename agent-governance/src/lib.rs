//! End-to-end reasoning capture and governance.
//!
//! A host agent runtime hands every proposed action to a
//! [`ReasoningGovernor`] before executing it. The local implementation runs
//! the [`GovernancePipeline`]: the conversation is normalised, reasoning is
//! extracted and scored, policy is evaluated, and the record is either
//! finalised or queued for human review. Every stage emits an audit event.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod governor;
pub mod pipeline;
pub mod remote;
pub mod request;

pub use error::{GovernanceError, GovernanceResult};
pub use governor::{
    COMPLETENESS_TARGET, LATENCY_TARGET_MS, LocalGovernor, QualityMetrics, ReasoningGovernor,
};
pub use pipeline::GovernancePipeline;
pub use remote::{GovernanceClient, RemoteGovernor};
pub use request::{GovernanceRequest, UNKNOWN_TASK};
