//! Core types for the error recovery engine
//!
//! ## Organization
//! - `failure` - The raw failure value callers hand to the engine
//! - `classified` - Classified error records, category and severity
//! - `notification` - User-facing notifications and tagged action effects
//! - `recovery` - Strategy names and recovery cycle records

pub mod classified;
pub mod failure;
pub mod notification;
pub mod recovery;

// Re-export commonly used types
pub use classified::{
    BrowserInfo, Classification, ClassifiedError, ErrorCategory, ErrorSeverity, Viewport,
};
pub use failure::{Failure, FailureKind};
pub use notification::{
    ActionEffect, ActionStyle, ErrorNotification, NotificationAction, NotificationLevel,
};
pub use recovery::{
    RecoveryAttempt, RecoveryOutcome, RecoveryReport, RecoveryState, RecoveryStrategy,
};
