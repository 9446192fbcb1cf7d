//! Configuration loader
//!
//! Builds a [`DictionaryConfig`] from environment variables, TOML or JSON
//! text, or a file whose format is picked by extension. Every source is
//! validated before it is returned.
//!
//! ## Environment Variables
//! - `ATOMDICT_LOCK_TIMEOUT_MS`: bounded lock wait in milliseconds
//! - `ATOMDICT_RETIRE_TOKENS_ON_FAILURE`: retire tokens after failed
//!   generation (true/false)
//! - `ATOMDICT_SHARD_AMOUNT`: shard count for both maps
//! - `ATOMDICT_TRACK_STATS`: maintain statistics counters (true/false)
//!
//! Unset variables keep their defaults.

use std::io;
use std::path::Path;
use std::time::Duration;

use atomdict_common::error::{CommonError, CommonResult};

use super::DictionaryConfig;

/// Bound on lock waits, in milliseconds
pub const ENV_LOCK_TIMEOUT_MS: &str = "ATOMDICT_LOCK_TIMEOUT_MS";
/// `true`/`false`: retire idle tokens after a failed generation
pub const ENV_RETIRE_TOKENS_ON_FAILURE: &str = "ATOMDICT_RETIRE_TOKENS_ON_FAILURE";
/// Shard count for both maps, a power of two greater than one
pub const ENV_SHARD_AMOUNT: &str = "ATOMDICT_SHARD_AMOUNT";
/// `true`/`false`: keep hit, miss and generation counters
pub const ENV_TRACK_STATS: &str = "ATOMDICT_TRACK_STATS";

/// Load configuration from the process environment
///
/// # Errors
/// Returns `CommonError::Config` if a variable does not parse, or
/// `CommonError::Validation` if the result fails validation.
pub fn from_env() -> CommonResult<DictionaryConfig> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup
///
/// [`from_env`] passes `std::env::var`; tests pass a map.
///
/// # Errors
/// Same as [`from_env`].
pub fn from_lookup<F>(lookup: F) -> CommonResult<DictionaryConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = DictionaryConfig::default();

    if let Some(raw) = lookup(ENV_LOCK_TIMEOUT_MS) {
        let millis = parse_var::<u64>(ENV_LOCK_TIMEOUT_MS, &raw)?;
        config.lock_timeout = Some(Duration::from_millis(millis));
    }
    if let Some(raw) = lookup(ENV_RETIRE_TOKENS_ON_FAILURE) {
        config.retire_tokens_on_failure = parse_bool(ENV_RETIRE_TOKENS_ON_FAILURE, &raw)?;
    }
    if let Some(raw) = lookup(ENV_SHARD_AMOUNT) {
        config.shard_amount = Some(parse_var::<usize>(ENV_SHARD_AMOUNT, &raw)?);
    }
    if let Some(raw) = lookup(ENV_TRACK_STATS) {
        config.track_stats = parse_bool(ENV_TRACK_STATS, &raw)?;
    }

    config.validate()?;
    tracing::debug!(?config, "config.loaded_from_env");
    Ok(config)
}

/// Parse a TOML document
///
/// # Errors
/// Returns `CommonError::Serialization` on malformed input, or
/// `CommonError::Validation` if the result fails validation.
pub fn from_toml_str(input: &str) -> CommonResult<DictionaryConfig> {
    let config: DictionaryConfig = toml::from_str(input)?;
    config.validate()?;
    Ok(config)
}

/// Parse a JSON document
///
/// # Errors
/// Same as [`from_toml_str`].
pub fn from_json_str(input: &str) -> CommonResult<DictionaryConfig> {
    let config: DictionaryConfig = serde_json::from_str(input)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a `.toml` or `.json` file
///
/// # Errors
/// Returns `CommonError::Config` if the file is missing or has an unknown
/// extension, `CommonError::Persistence` if it cannot be read, and parse or
/// validation errors as for [`from_toml_str`].
pub fn load_from_file(path: impl AsRef<Path>) -> CommonResult<DictionaryConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            CommonError::config(format!("Config file not found: {}", path.display()))
        }
        _ => CommonError::persistence_op("read_config", format!("{}: {e}", path.display())),
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => from_toml_str(&contents)?,
        Some("json") => from_json_str(&contents)?,
        other => {
            return Err(CommonError::config(format!(
                "Unsupported config format {:?} for {}; expected .toml or .json",
                other.unwrap_or(""),
                path.display()
            )));
        }
    };

    tracing::info!(path = %path.display(), "config.loaded_from_file");
    Ok(config)
}

fn parse_var<T>(name: &str, raw: &str) -> CommonResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| CommonError::config_field(name, format!("invalid value '{raw}': {e}")))
}

fn parse_bool(name: &str, raw: &str) -> CommonResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CommonError::config_field(name, format!("invalid boolean '{raw}'"))),
    }
}
