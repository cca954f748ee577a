//! # error-recovery
//!
//! Error classification, user notification and automatic recovery for
//! long-running applications.
//!
//! ## Key Features
//!
//! - **Classification**: Every failure gets a category, a severity and a recoverability flag
//! - **Context Enrichment**: Connection, viewport, memory and timing captured with each error
//! - **Notifications**: Category-specific user messages with actionable buttons
//! - **Recovery Strategies**: Retry, backoff, reload, navigation, cache clearing, reporting
//! - **Cancellable Backoff**: Pending retries are cancelled on teardown and `clear_errors`
//! - **Observable State**: A single store of errors and notifications, subscribable via `watch`
//!
//! ## Example
//!
//! ```rust,no_run
//! use error_recovery::{ErrorHandler, Failure, HandleOptions, HandlerConfig, RecoveryStrategy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let handler = ErrorHandler::from_config(HandlerConfig::default())?;
//!
//! let body = handler
//!     .handle_async_operation(
//!         || async { reqwest::get("https://example.com/api").await?.text().await },
//!         HandleOptions::new()
//!             .component("Dashboard")
//!             .strategy(RecoveryStrategy::RetryWithBackoff),
//!     )
//!     .await?;
//!
//! if body.is_none() {
//!     let notifications = handler.state().notifications;
//!     println!("{} notification(s) pending", notifications.len());
//! }
//! handler.handle_error(Failure::http(500, "Internal Server Error"), HandleOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Core types: failures, classified errors, notifications, strategies
pub mod core_types;

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod classifier;
pub mod config;
pub mod enricher;
pub mod error;
pub mod executor;
pub mod global;
pub mod handler;
pub mod notifications;
pub mod platform;
pub mod retry;
pub mod store;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use classifier::{classify, Classifier};
pub use config::{BackoffPolicy, ClassifierPolicy, HandlerConfig, RecoveryConfig, RecoveryOverrides};
pub use enricher::{ContextEnricher, EnhancedContext, ErrorContext};
pub use error::{RecoveryError, RecoveryResult};
pub use executor::{retry_operation, RecoveryExecutor, RetryOperation};
pub use global::{
    install_panic_hook, report_failure, report_resource_failure, report_task_failure,
    spawn_supervised, PanicHookGuard, ResourceKind, GLOBAL_COMPONENT,
};
pub use handler::{ActionHandler, ErrorHandler, HandleOptions};
pub use logging::{ErrorLogger, TracingErrorLogger};
pub use notifications::NotificationFactory;
pub use platform::{ConnectionInfo, HeadlessPlatform, MemorySnapshot, Platform, TimingSnapshot};
pub use retry::RetryScheduler;
pub use store::{ErrorAction, ErrorState, ErrorStore};

// Re-export core types
pub use core_types::{
    ActionEffect, ActionStyle, BrowserInfo, Classification, ClassifiedError, ErrorCategory,
    ErrorNotification, ErrorSeverity, Failure, FailureKind, NotificationAction,
    NotificationLevel, RecoveryAttempt, RecoveryOutcome, RecoveryReport, RecoveryState,
    RecoveryStrategy, Viewport,
};
