//! Reasoning extraction for agent conversations.
//!
//! The pipeline is normalise, extract, score: [`MessageNormalizer`] flattens
//! the conversation, [`Extractor`] applies the cue-lexicon strategies to
//! produce a [`ReasoningRecord`](agent_primitives::ReasoningRecord), and
//! [`CompletenessScorer`] annotates it with a completeness assessment.

#![warn(missing_docs, clippy::pedantic)]

pub mod config;
mod error;
pub mod extractor;
pub mod lexicon;
pub mod normalizer;
pub mod scorer;

pub use config::{ExtractionConfig, ScoringConfig};
pub use error::{ExtractionError, ExtractionResult};
pub use extractor::Extractor;
pub use normalizer::{MessageNormalizer, NormalizedConversation, Segment};
pub use scorer::CompletenessScorer;
