//! Structured logging setup.
//!
//! Every crate in the workspace logs through `tracing`; binaries and tests
//! that want the output visible call [`init_tracing`] once at startup.

#![warn(missing_docs, clippy::pedantic)]

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Directive used when neither `RUST_LOG` nor the caller supplies one.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Installs a formatted subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` when the variable is unset or empty.
///
/// Returns `Ok(false)` when a global subscriber was already installed; the
/// existing subscriber stays in place.
///
/// # Errors
///
/// Fails when `default_directive` is not a valid filter directive.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<bool> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), default_directive)?;

    match fmt().with_env_filter(filter).with_target(true).try_init() {
        Ok(()) => {
            tracing::debug!("tracing subscriber installed");
            Ok(true)
        }
        Err(err) => {
            tracing::debug!(%err, "tracing subscriber already installed");
            Ok(false)
        }
    }
}

fn build_filter(env: Option<&str>, default_directive: &str) -> anyhow::Result<EnvFilter> {
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid RUST_LOG directives `{directives}`")),
        None => EnvFilter::try_new(default_directive)
            .with_context(|| format!("invalid default directive `{default_directive}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directives_take_precedence() {
        let filter = build_filter(Some("agent_review=debug"), "warn").unwrap();
        assert_eq!(filter.to_string(), "agent_review=debug");
    }

    #[test]
    fn blank_env_falls_back_to_default() {
        let filter = build_filter(Some("  "), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn invalid_default_is_an_error() {
        assert!(build_filter(None, "agent_review=loud").is_err());
    }

    #[test]
    fn repeat_initialisation_is_not_fatal() {
        let _ = init_tracing(DEFAULT_DIRECTIVE).unwrap();
        assert!(!init_tracing(DEFAULT_DIRECTIVE).unwrap());
    }
}
