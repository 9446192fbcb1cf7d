//! Dictionary error types
//!
//! `DictionaryError` composes with [`CommonError`] for configuration and I/O
//! failures and adds the variants specific to keyed generation.

use std::time::Duration;

use atomdict_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Boxed error returned by fallible generators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for dictionary operations
pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Errors surfaced by [`AtomicDictionary`](crate::AtomicDictionary)
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// The caller's generator failed; nothing was stored
    #[error("value generation failed for key {key}: {source}")]
    Generation {
        key: String,
        #[source]
        source: BoxError,
    },

    /// A bounded wait on the barrier or a key token expired
    #[error("timed out after {waited:?} waiting for {lock} (key {key})")]
    LockTimeout { lock: &'static str, key: String, waited: Duration },

    /// The dictionary was disposed
    #[error("dictionary has been disposed")]
    Disposed,

    /// Shared error (configuration, I/O, serialization)
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl DictionaryError {
    pub(crate) fn generation(key: String, source: impl Into<BoxError>) -> Self {
        Self::Generation { key, source: source.into() }
    }

    pub(crate) fn lock_timeout(lock: &'static str, key: String, waited: Duration) -> Self {
        Self::LockTimeout { lock, key, waited }
    }

    /// How long a timed-out caller waited
    pub fn waited(&self) -> Option<Duration> {
        match self {
            Self::LockTimeout { waited, .. } => Some(*waited),
            _ => None,
        }
    }

    /// Stable name of the variant, for logs
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::Generation { .. } => "generation",
            Self::LockTimeout { .. } => "lock_timeout",
            Self::Disposed => "disposed",
            Self::Common(e) => e.error_type_name(),
        }
    }
}

atomdict_common::impl_error_conversion!(DictionaryError, Common);

impl From<toml::de::Error> for DictionaryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Common(CommonError::from(err))
    }
}

atomdict_common::impl_error_classification!(DictionaryError, Common,
    Self::Generation { .. } => {
        retryable: true,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::LockTimeout { .. } => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::Disposed => {
        retryable: false,
        severity: ErrorSeverity::Info,
        critical: false,
    },
);
