//! Governance policy evaluation for reasoning records.
//!
//! [`PolicyEngine`] applies magnitude limits, blacklist checks, timing
//! restrictions, and a completeness gate to a scored
//! [`ReasoningRecord`](agent_primitives::ReasoningRecord), producing a
//! [`PolicyVerdict`](agent_primitives::PolicyVerdict).

#![warn(missing_docs, clippy::pedantic)]

pub mod config;
pub mod contracts;
pub mod decision;
pub mod engine;
mod error;
pub mod magnitude;

pub use config::{Blacklist, PolicyConfig, TimingRestrictions, TradeLimits};
pub use contracts::EvaluationContext;
pub use decision::Findings;
pub use engine::PolicyEngine;
pub use error::{PolicyError, PolicyResult};
pub use magnitude::{Magnitude, action_magnitude, parse_magnitude};
