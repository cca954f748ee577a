//! Classified error records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::failure::Failure;

/// What kind of failure an error represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Connectivity, timeouts, aborted requests, offline host
    Network,
    /// HTTP 401, the user must sign in again
    Authentication,
    /// HTTP 403, the user lacks permission
    Authorization,
    /// HTTP 5xx
    Server,
    /// Other HTTP 4xx
    Client,
    /// Schema or parse failures
    Validation,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Severity, orthogonal to category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => f.write_str("info"),
            ErrorSeverity::Warning => f.write_str("warning"),
            ErrorSeverity::Critical => f.write_str("critical"),
        }
    }
}

/// Output of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub recoverable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Snapshot of the host environment at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    pub user_agent: String,
    pub url: String,
    pub viewport: Option<Viewport>,
}

/// One captured failure with its classification.
///
/// Fields are read-only once constructed: the id and timestamp are assigned at
/// capture time and the classification is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    id: String,
    name: String,
    message: String,
    stack: Option<String>,
    status: Option<u16>,
    category: ErrorCategory,
    severity: ErrorSeverity,
    recoverable: bool,
    component: Option<String>,
    timestamp: DateTime<Utc>,
    browser_info: Option<BrowserInfo>,
}

impl ClassifiedError {
    /// Capture `failure` under a fresh id and the current time
    pub fn capture(
        failure: &Failure,
        classification: Classification,
        component: Option<String>,
        browser_info: Option<BrowserInfo>,
    ) -> Self {
        let name = if failure.name().is_empty() {
            "Error".to_string()
        } else {
            failure.name().to_string()
        };
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            message: failure.message().to_string(),
            stack: failure.stack().map(str::to_string),
            status: failure.status(),
            category: classification.category,
            severity: classification.severity,
            recoverable: classification.recoverable,
            component,
            timestamp: Utc::now(),
            browser_info,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn browser_info(&self) -> Option<&BrowserInfo> {
        self.browser_info.as_ref()
    }

    pub fn classification(&self) -> Classification {
        Classification {
            category: self.category,
            severity: self.severity,
            recoverable: self.recoverable,
        }
    }
}
