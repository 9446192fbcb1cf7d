//! Observability bootstrap
//!
//! The library crates only emit `tracing` events; binaries, benches and
//! tests decide where they go. [`init_tracing`] installs the standard
//! `tracing_subscriber` fmt subscriber used across the workspace.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{CommonError, CommonResult};

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset (e.g. `"info"`,
    /// `"atomdict_core=debug"`)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false, with_target: true }
    }
}

impl LoggingConfig {
    /// Debug-level preset, handy in tests
    pub fn debug() -> Self {
        Self { level: "debug".to_string(), ..Self::default() }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `config.level` when set.
///
/// # Errors
/// Returns `CommonError::Config` if the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> CommonResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| CommonError::config_field("level", e.to_string()))?;

    let builder = fmt().with_env_filter(filter).with_target(config.with_target);

    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };

    installed.map_err(|e| CommonError::config(format!("tracing subscriber not installed: {e}")))
}
