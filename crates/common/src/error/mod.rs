//! Shared error vocabulary for atomdict crates
//!
//! 1. **`CommonError`**: failures that are not specific to one crate
//!    (configuration, validation, parsing, file access)
//! 2. **`ErrorClassification`**: retryability and severity, so callers can
//!    build retry policies without matching on concrete types
//! 3. **`ErrorSeverity`**: one severity scale for logs
//!
//! ## Composing crate errors
//!
//! Crate errors embed `CommonError` instead of duplicating its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum DictionaryError {
//!     #[error("value generation failed for key {key}")]
//!     Generation { key: String, source: BoxError },
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl_error_conversion!(DictionaryError, Common);
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias over [`CommonError`]
pub type CommonResult<T> = Result<T, CommonError>;

/// Failures shared by the workspace crates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// Settings that are missing, malformed or cannot be applied
    #[error("Configuration error{}: {message}", in_field(.field))]
    Config { message: String, field: Option<String> },

    /// A value violates a documented constraint
    #[error("Validation error for field '{field}'{}: {message}", with_value(.value))]
    Validation { field: String, message: String, value: Option<String> },

    /// JSON or TOML could not be parsed or produced
    #[error("Serialization error{}: {message}", in_format(.format))]
    Serialization { message: String, format: Option<String> },

    /// File access failed
    #[error("Persistence error{}: {message}", during(.operation))]
    Persistence { message: String, operation: Option<String> },
}

fn in_field(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(" in field '{f}'")).unwrap_or_default()
}

fn with_value(value: &Option<String>) -> String {
    value.as_ref().map(|v| format!(" (value: '{v}')")).unwrap_or_default()
}

fn in_format(format: &Option<String>) -> String {
    format.as_ref().map(|f| format!(" ({f})")).unwrap_or_default()
}

fn during(operation: &Option<String>) -> String {
    operation.as_ref().map(|op| format!(" during '{op}'")).unwrap_or_default()
}

impl CommonError {
    /// Configuration error without a field
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Configuration error naming the offending field or variable
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: None }
    }

    /// Validation error carrying the rejected value
    pub fn validation_with_value<F: Into<String>, M: Into<String>, V: Into<String>>(
        field: F,
        message: M,
        value: V,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), value: Some(value.into()) }
    }

    /// Serialization error tagged with its format
    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Persistence error without an operation
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into(), operation: None }
    }

    /// Persistence error naming the failed operation
    pub fn persistence_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }

    /// Stable name of the variant, for log fields
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Serialization { .. } => "serialization",
            Self::Persistence { .. } => "persistence",
        }
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        // Only file access can succeed on a second attempt.
        matches!(self, Self::Persistence { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Persistence { .. } => ErrorSeverity::Warning,
            Self::Config { .. } | Self::Validation { .. } | Self::Serialization { .. } => {
                ErrorSeverity::Error
            }
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Retry and alerting hints for an error
///
/// Nothing in the workspace retries on its own; a caller that sees a
/// retryable error decides whether to call again.
pub trait ErrorClassification {
    /// Whether the same call may succeed later
    fn is_retryable(&self) -> bool;

    /// Severity for logging
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error points at a broken invariant
    fn is_critical(&self) -> bool;

    /// Suggested delay before retrying, if any
    fn retry_after(&self) -> Option<Duration>;
}

/// Severity scale shared by all crate errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected outcome, logged for context
    Info,
    /// Worth watching, not an outage
    Warning,
    /// The operation failed
    Error,
    /// A bug; needs attention
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

/// Route `serde_json` and `std::io` errors through a crate error's
/// `CommonError` variant
///
/// The calling crate must depend on `serde_json`.
///
/// ```rust,ignore
/// impl_error_conversion!(DictionaryError, Common);
/// ```
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

/// Implement [`ErrorClassification`] for a crate error, delegating its
/// `CommonError` variant and listing the rest explicitly
///
/// The caller must have `ErrorClassification` in scope.
///
/// ```rust,ignore
/// impl_error_classification!(DictionaryError, Common,
///     Self::Disposed => {
///         retryable: false,
///         severity: ErrorSeverity::Info,
///         critical: false,
///     }
/// );
/// ```
#[macro_export]
macro_rules! impl_error_classification {
    (
        $error_type:ty,
        $common_variant:ident
        $(,
            $variant:pat => {
                retryable: $retryable:expr,
                severity: $severity:expr,
                critical: $critical:expr
                $(,)?
            }
        )*
        $(,)?
    ) => {
        impl $crate::error::ErrorClassification for $error_type {
            fn is_retryable(&self) -> bool {
                match self {
                    Self::$common_variant(e) => e.is_retryable(),
                    $($variant => $retryable,)*
                }
            }

            fn severity(&self) -> $crate::error::ErrorSeverity {
                match self {
                    Self::$common_variant(e) => e.severity(),
                    $($variant => $severity,)*
                }
            }

            fn is_critical(&self) -> bool {
                match self {
                    Self::$common_variant(e) => e.is_critical(),
                    $($variant => $critical,)*
                }
            }

            fn retry_after(&self) -> Option<std::time::Duration> {
                match self {
                    Self::$common_variant(e) => e.retry_after(),
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }
        }
    };
}
