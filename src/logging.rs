//! Logging utilities for error-recovery
//!
//! Re-exports tracing macros with log_* naming convention for consistency, and
//! provides the outbound logging sink the handler reports classified errors to.

// Re-export tracing macros with log_* naming
pub(crate) use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    warn as log_warn,
};

use crate::core_types::{ClassifiedError, ErrorSeverity};
use crate::enricher::EnhancedContext;

/// Sink for classified errors.
///
/// The handler calls [`log_error`](ErrorLogger::log_error) once per captured
/// failure when `log_error` is enabled in the recovery configuration. Stack
/// traces belong here, never in notifications.
pub trait ErrorLogger: Send + Sync {
    /// Record a classified error together with its enriched context
    fn log_error(&self, error: &ClassifiedError, context: &EnhancedContext);
}

/// Default [`ErrorLogger`] that emits structured `tracing` events.
///
/// Severity picks the level: critical → ERROR, warning → WARN, info → INFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorLogger;

impl ErrorLogger for TracingErrorLogger {
    fn log_error(&self, error: &ClassifiedError, context: &EnhancedContext) {
        let context_json = serde_json::to_string(context).unwrap_or_default();
        match error.severity() {
            ErrorSeverity::Critical => log_error!(
                error_id = %error.id(),
                name = %error.name(),
                category = %error.category(),
                component = error.component().unwrap_or("unknown"),
                status = error.status(),
                stack = error.stack().unwrap_or(""),
                context = %context_json,
                "{}",
                error.message()
            ),
            ErrorSeverity::Warning => log_warn!(
                error_id = %error.id(),
                name = %error.name(),
                category = %error.category(),
                component = error.component().unwrap_or("unknown"),
                status = error.status(),
                stack = error.stack().unwrap_or(""),
                context = %context_json,
                "{}",
                error.message()
            ),
            ErrorSeverity::Info => log_info!(
                error_id = %error.id(),
                name = %error.name(),
                category = %error.category(),
                component = error.component().unwrap_or("unknown"),
                context = %context_json,
                "{}",
                error.message()
            ),
        }
    }
}
