//! Aggregate configuration for the governance gate.
//!
//! [`GovernanceConfig`] bundles the extraction, scoring, policy, and review
//! settings into one JSON document. Every section and key is optional;
//! missing values fall back to the documented defaults of each crate.

#![warn(missing_docs, clippy::pedantic)]

use std::path::{Path, PathBuf};

use agent_policy::PolicyConfig;
use agent_reasoning::{ExtractionConfig, ScoringConfig};
use agent_review::ReviewConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file read by
/// [`GovernanceConfig::from_env`].
pub const CONFIG_ENV: &str = "GOVERNANCE_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A section parsed but failed validation.
    #[error("invalid `{section}` configuration: {reason}")]
    Invalid {
        /// Top-level section that failed.
        section: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(section: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Invalid {
            section,
            reason: err.to_string(),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Every tunable of the gate in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GovernanceConfig {
    /// Cue lexicons and span bounds for the extractor.
    pub extraction: ExtractionConfig,
    /// Completeness thresholds and weights.
    pub scoring: ScoringConfig,
    /// Trade limits, blacklist, and timing restrictions.
    pub policy: PolicyConfig,
    /// Review time-to-live and sweep cadence.
    pub review: ReviewConfig,
}

impl GovernanceConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a section fails validation.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// see [`GovernanceConfig::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        info!(path = %path.display(), "governance configuration loaded");
        Ok(config)
    }

    /// Loads the file named by `GOVERNANCE_CONFIG`, or the defaults when the
    /// variable is unset.
    ///
    /// # Errors
    ///
    /// See [`GovernanceConfig::from_path`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_var(CONFIG_ENV)
    }

    /// Loads the file named by the environment variable `name`, or the
    /// defaults when it is unset or empty.
    ///
    /// # Errors
    ///
    /// See [`GovernanceConfig::from_path`].
    pub fn from_env_var(name: &str) -> ConfigResult<Self> {
        match std::env::var_os(name) {
            Some(path) if !path.is_empty() => Self::from_path(PathBuf::from(path)),
            _ => {
                debug!(variable = name, "no configuration file set; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first failing section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.extraction
            .validate()
            .map_err(|err| ConfigError::invalid("extraction", err))?;
        self.scoring
            .validate()
            .map_err(|err| ConfigError::invalid("scoring", err))?;
        self.policy
            .validate()
            .map_err(|err| ConfigError::invalid("policy", err))?;
        self.review
            .validate()
            .map_err(|err| ConfigError::invalid("review", err))?;
        Ok(())
    }
}
