//! Error types for recovery operations.
//!
//! This module provides the crate's own error type. It is distinct from
//! [`Failure`](crate::core_types::Failure), which is the *input* the engine
//! classifies: [`RecoveryError`] describes what went wrong while recovering.
//!
//! # Error Types
//!
//! The main error type is [`RecoveryError`], which covers:
//! - Retry exhaustion (distinct from the failure that was being retried)
//! - Cancelled retries (teardown, `clear_errors`)
//! - Strategy and platform failures
//! - Invalid configuration
//! - Failures re-raised to the caller on request
//!
//! # Error Handling Example
//!
//! ```rust,no_run
//! use error_recovery::{RecoveryError, RecoveryResult};
//!
//! fn explain(result: RecoveryResult<u32>) {
//!     match result {
//!         Ok(value) => println!("recovered: {value}"),
//!         Err(RecoveryError::MaxRetriesExceeded { attempts, .. }) => {
//!             println!("gave up after {attempts} attempts");
//!         }
//!         Err(err) => println!("Tell user: {}", err.user_message()),
//!     }
//! }
//! ```

use crate::core_types::{ErrorCategory, ErrorSeverity, RecoveryStrategy};
use crate::logging::{log_debug, log_error, log_warn};
use thiserror::Error;

/// Convenient result type for recovery operations.
///
/// Alias for `Result<T, RecoveryError>`.
pub type RecoveryResult<T> = std::result::Result<T, RecoveryError>;

/// Errors that can occur while handling and recovering from failures.
///
/// # Creating Errors
///
/// Use the constructor methods which automatically log the error:
///
/// ```rust
/// use error_recovery::RecoveryError;
///
/// let err = RecoveryError::configuration_error("max_retries must be > 0");
/// let err = RecoveryError::retry_cancelled("err-1");
/// ```
///
/// | Variant | Severity | Retryable |
/// |---------|----------|-----------|
/// | `MaxRetriesExceeded` | Critical | No |
/// | `RetryCancelled` | Info | No |
/// | `StrategyFailed` | Warning | Yes |
/// | `PlatformError` | Warning | Yes |
/// | `ConfigurationError` | Critical | No |
/// | `Unrecovered` | Warning | No |
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Every retry attempt failed.
    ///
    /// Carries the attempt count and the last underlying failure message so
    /// callers can tell retry exhaustion apart from the failure itself.
    #[error("Max retries exceeded for {error_id} after {attempts} attempts: {last_failure}")]
    MaxRetriesExceeded {
        error_id: String,
        /// Total invocations, including the initial one
        attempts: u32,
        last_failure: String,
    },

    /// A pending retry was cancelled before it fired.
    #[error("Retry cancelled for {error_id}")]
    RetryCancelled { error_id: String },

    /// A recovery strategy could not complete.
    #[error("Recovery strategy {strategy} failed: {message}")]
    StrategyFailed {
        strategy: RecoveryStrategy,
        message: String,
    },

    /// The host platform rejected an effectful call (cache clearing, etc.).
    #[error("Platform operation failed: {message}")]
    PlatformError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Recovery configuration is invalid.
    #[error("Recovery configuration error: {message}")]
    ConfigurationError { message: String },

    /// A handled failure re-raised because the caller asked for `rethrow`.
    #[error("Unrecovered {category} error {error_id}: {message}")]
    Unrecovered {
        error_id: String,
        category: ErrorCategory,
        message: String,
    },
}

impl RecoveryError {
    /// Severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MaxRetriesExceeded { .. } => ErrorSeverity::Critical,
            Self::RetryCancelled { .. } => ErrorSeverity::Info,
            Self::StrategyFailed { .. } => ErrorSeverity::Warning,
            Self::PlatformError { .. } => ErrorSeverity::Warning,
            Self::ConfigurationError { .. } => ErrorSeverity::Critical,
            Self::Unrecovered { .. } => ErrorSeverity::Warning,
        }
    }

    /// Whether running the same recovery again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StrategyFailed { .. } | Self::PlatformError { .. }
        )
    }

    /// Convert to a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::MaxRetriesExceeded { .. } => {
                "We couldn't complete the request after several attempts".to_string()
            }
            Self::RetryCancelled { .. } => "The retry was cancelled".to_string(),
            Self::StrategyFailed { .. } => "Automatic recovery didn't succeed".to_string(),
            Self::PlatformError { .. } => "The application couldn't complete that action".to_string(),
            Self::ConfigurationError { .. } => {
                "Error handling is misconfigured. Please contact support".to_string()
            }
            Self::Unrecovered { .. } => "Something went wrong. Please try again".to_string(),
        }
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    /// Create a retry exhaustion error (logs at ERROR level).
    pub fn max_retries_exceeded(
        error_id: impl Into<String>,
        attempts: u32,
        last_failure: impl Into<String>,
    ) -> Self {
        let error_id = error_id.into();
        let last_failure = last_failure.into();
        log_error!(
            error_type = "max_retries_exceeded",
            error_id = %error_id,
            attempts = attempts,
            last_failure = %last_failure,
            "Retry attempts exhausted"
        );
        Self::MaxRetriesExceeded {
            error_id,
            attempts,
            last_failure,
        }
    }

    pub fn retry_cancelled(error_id: impl Into<String>) -> Self {
        let error_id = error_id.into();
        log_debug!(
            error_type = "retry_cancelled",
            error_id = %error_id,
            "Pending retry cancelled"
        );
        Self::RetryCancelled { error_id }
    }

    pub fn strategy_failed(strategy: RecoveryStrategy, message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "strategy_failed",
            strategy = %strategy,
            message = %message,
            "Recovery strategy failed"
        );
        Self::StrategyFailed { strategy, message }
    }

    pub fn platform_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "platform_error",
            message = %message,
            has_source = source.is_some(),
            "Platform operation failed"
        );
        Self::PlatformError { message, source }
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Recovery configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn unrecovered(
        error_id: impl Into<String>,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        let error_id = error_id.into();
        let message = message.into();
        log_debug!(
            error_type = "unrecovered",
            error_id = %error_id,
            category = %category,
            "Re-raising handled failure to caller"
        );
        Self::Unrecovered {
            error_id,
            category,
            message,
        }
    }
}
