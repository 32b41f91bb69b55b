//! Reasoning capture and governance gate for autonomous agents.
//!
//! Depend on this crate via `cargo add reasoning-gate`. It bundles the
//! workspace crates behind feature flags so hosts can pull in only the
//! extraction engine, only the policy engine, or the full gate.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use agent_primitives as primitives;

/// Reasoning extraction and completeness scoring (enabled by `reasoning` feature).
#[cfg(feature = "reasoning")]
pub use agent_reasoning as reasoning;

/// Policy evaluation (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use agent_policy as policy;

/// Append-only audit recording (enabled by `audit` feature).
#[cfg(feature = "audit")]
pub use agent_audit as audit;

/// Human review workflow and record store (enabled by `review` feature).
#[cfg(feature = "review")]
pub use agent_review as review;

/// Aggregate configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use agent_config as config;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// End-to-end pipeline and governors (enabled by `governance` feature).
#[cfg(feature = "governance")]
pub use agent_governance as governance;

/// Types most hosts need to wire the gate into an agent loop.
#[cfg(feature = "governance")]
pub mod prelude {
    pub use agent_governance::{
        GovernancePipeline, GovernanceRequest, LocalGovernor, ReasoningGovernor,
    };
    pub use agent_policy::EvaluationContext;
    pub use agent_primitives::{
        ConversationMessage, PolicyDecision, ProposedAction, ReasoningRecord, ReviewState,
    };
    pub use agent_review::{ExpirySweeper, ReviewSubmission, ReviewWorkflow};
}
