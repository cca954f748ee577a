//! The raw failure value handed to the engine.
//!
//! A [`Failure`] carries what the classifier needs to know about something that
//! went wrong: a name, a message, an optional stack, an optional HTTP status and
//! a coarse [`FailureKind`]. Conversions exist for the error types callers most
//! often hold (`anyhow`, `reqwest`, `serde_json`, `std::io`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RecoveryError;

/// Coarse origin of a failure, set by constructors and conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No further information
    #[default]
    Generic,
    /// Transport-level failure (connect, DNS, reset)
    Network,
    /// The operation exceeded its deadline
    Timeout,
    /// The operation was aborted before completing
    Aborted,
    /// Input or response failed schema/parse validation
    Validation,
    /// A panic captured from a task or the panic hook
    Panic,
    /// A script, stylesheet or image failed to load
    Resource,
}

/// A failure as reported by a caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Failure {
    name: String,
    message: String,
    stack: Option<String>,
    status: Option<u16>,
    kind: FailureKind,
    critical: bool,
}

impl Failure {
    /// Create a generic failure named `Error`
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failure carrying an HTTP status code
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::named("HttpError", message)
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            ..Self::named("NetworkError", message)
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            ..Self::named("TimeoutError", message)
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            ..Self::named("ValidationError", message)
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = kind;
        self
    }

    /// Escalate to critical severity regardless of category
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Build a failure from any error, keeping its source chain as the stack
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        let failure = Self::new(error.to_string());
        if chain.is_empty() {
            failure
        } else {
            failure.with_stack(chain.join("\n"))
        }
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

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.message.is_empty()) {
            (true, true) => write!(f, "unknown failure"),
            (true, false) => write!(f, "{}", self.message),
            (false, true) => write!(f, "{}", self.name),
            (false, false) => write!(f, "{}: {}", self.name, self.message),
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // Prefer the more specific conversions when the root is a known type
        if let Some(recovery) = error.downcast_ref::<RecoveryError>() {
            return Self::from_recovery_error(recovery);
        }
        if let Some(http) = error.downcast_ref::<reqwest::Error>() {
            return Self::from(http).with_stack(format!("{error:?}"));
        }
        if let Some(io) = error.downcast_ref::<std::io::Error>() {
            return Self::from(io).with_stack(format!("{error:?}"));
        }
        if let Some(json) = error.downcast_ref::<serde_json::Error>() {
            return Self::from(json).with_stack(format!("{error:?}"));
        }
        Self::new(error.to_string()).with_stack(format!("{error:?}"))
    }
}

impl From<&reqwest::Error> for Failure {
    fn from(error: &reqwest::Error) -> Self {
        let message = error.to_string();
        let failure = if error.is_timeout() {
            Self::timeout(message)
        } else if error.is_connect() || error.is_request() {
            Self::network(message)
        } else if error.is_decode() {
            Self {
                kind: FailureKind::Validation,
                ..Self::named("SyntaxError", message)
            }
        } else {
            Self::named("HttpError", message)
        };
        match error.status() {
            Some(status) => failure.with_status(status.as_u16()),
            None => failure,
        }
    }
}

impl From<reqwest::Error> for Failure {
    fn from(error: reqwest::Error) -> Self {
        Self::from(&error)
    }
}

impl From<&std::io::Error> for Failure {
    fn from(error: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        let message = error.to_string();
        match error.kind() {
            ErrorKind::TimedOut => Self::timeout(message),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe => Self::network(message),
            ErrorKind::InvalidData | ErrorKind::InvalidInput => Self::validation(message),
            _ => Self::named("IoError", message),
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Self::from(&error)
    }
}

impl From<&serde_json::Error> for Failure {
    fn from(error: &serde_json::Error) -> Self {
        Self {
            kind: FailureKind::Validation,
            ..Self::named("SyntaxError", error.to_string())
        }
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Self::from(&error)
    }
}

impl From<RecoveryError> for Failure {
    fn from(error: RecoveryError) -> Self {
        Self::from_recovery_error(&error)
    }
}

impl Failure {
    fn from_recovery_error(error: &RecoveryError) -> Self {
        let name = match error {
            RecoveryError::MaxRetriesExceeded { .. } => "MaxRetriesExceededError",
            RecoveryError::RetryCancelled { .. } => "AbortError",
            RecoveryError::StrategyFailed { .. } => "RecoveryError",
            RecoveryError::PlatformError { .. } => "PlatformError",
            RecoveryError::ConfigurationError { .. } => "ConfigurationError",
            RecoveryError::Unrecovered { .. } => "UnrecoveredError",
        };
        let failure = Self::named(name, error.to_string());
        if matches!(error, RecoveryError::RetryCancelled { .. }) {
            failure.with_kind(FailureKind::Aborted)
        } else {
            failure
        }
    }
}
