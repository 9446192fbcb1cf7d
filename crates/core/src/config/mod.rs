//! Dictionary configuration and builder
//!
//! Every field has a default, so an empty TOML/JSON document is a valid
//! configuration. See [`loader`] for environment and file sources.

pub mod loader;

use std::time::Duration;

use atomdict_common::error::{CommonError, CommonResult};
use atomdict_common::option_duration_millis;
use serde::{Deserialize, Serialize};

pub use loader::{from_env, from_json_str, from_toml_str, load_from_file};

/// Runtime settings for an [`AtomicDictionary`](crate::AtomicDictionary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Upper bound on waits for the global barrier and key tokens
    /// (`None` = wait indefinitely). Serialized as milliseconds.
    #[serde(with = "option_duration_millis", skip_serializing_if = "Option::is_none")]
    pub lock_timeout: Option<Duration>,

    /// Retire a key's token after a failed generation if no other caller
    /// holds it
    pub retire_tokens_on_failure: bool,

    /// Shard count for both internal maps (`None` = dashmap default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_amount: Option<usize>,

    /// Maintain hit/miss/generation counters
    pub track_stats: bool,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self { lock_timeout: None, retire_tokens_on_failure: true, shard_amount: None, track_stats: true }
    }
}

impl DictionaryConfig {
    /// Create a new configuration builder
    pub fn builder() -> DictionaryConfigBuilder {
        DictionaryConfigBuilder::default()
    }

    /// Preset with bounded lock waits
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use atomdict_core::DictionaryConfig;
    ///
    /// let config = DictionaryConfig::bounded(Duration::from_millis(250));
    /// assert_eq!(config.lock_timeout, Some(Duration::from_millis(250)));
    /// ```
    pub fn bounded(lock_timeout: Duration) -> Self {
        Self { lock_timeout: Some(lock_timeout), ..Self::default() }
    }

    /// Check field constraints
    ///
    /// # Errors
    /// Returns `CommonError::Validation` if `shard_amount` is not a power of
    /// two greater than one, or if `lock_timeout` is zero.
    pub fn validate(&self) -> CommonResult<()> {
        if let Some(shards) = self.shard_amount {
            if shards <= 1 || !shards.is_power_of_two() {
                return Err(CommonError::validation_with_value(
                    "shard_amount",
                    "must be a power of two greater than 1",
                    shards.to_string(),
                ));
            }
        }

        if self.lock_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(CommonError::validation(
                "lock_timeout",
                "must be greater than zero; omit it to wait indefinitely",
            ));
        }

        Ok(())
    }
}

/// Builder for [`DictionaryConfig`] with fluent API
#[derive(Debug, Default)]
pub struct DictionaryConfigBuilder {
    config: DictionaryConfig,
}

impl DictionaryConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound barrier and token waits
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = Some(timeout);
        self
    }

    /// Keep tokens after failed generations
    pub fn retire_tokens_on_failure(mut self, enabled: bool) -> Self {
        self.config.retire_tokens_on_failure = enabled;
        self
    }

    /// Set the shard count for both maps
    pub fn shard_amount(mut self, shards: usize) -> Self {
        self.config.shard_amount = Some(shards);
        self
    }

    /// Enable or disable statistics counters
    pub fn track_stats(mut self, enabled: bool) -> Self {
        self.config.track_stats = enabled;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// See [`DictionaryConfig::validate`].
    pub fn build(self) -> CommonResult<DictionaryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
