//! Failure classification.
//!
//! Maps a [`Failure`] to a category, a severity and a recoverability flag.
//! Classification is pure: the only ambient input is the host's online status,
//! which callers read from the platform and pass in.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ClassifierPolicy;
use crate::core_types::{Classification, ErrorCategory, ErrorSeverity, Failure, FailureKind};

static NETWORK_MESSAGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(failed to fetch|network ?error|network request failed|connection (refused|reset|closed|aborted)|timed? ?out|dns|unreachable|offline)\b",
    )
    .ok()
});

static VALIDATION_MESSAGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)\b(validation|invalid|schema|unexpected token|parse error|failed to parse|malformed)\b")
        .ok()
});

const NETWORK_NAMES: [&str; 3] = ["NetworkError", "TimeoutError", "AbortError"];
const VALIDATION_NAMES: [&str; 3] = ["ValidationError", "ZodError", "SyntaxError"];

fn pattern_matches(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Classify with the default policy.
pub fn classify(failure: &Failure, online: bool) -> Classification {
    Classifier::default().classify(failure, online)
}

/// Failure classifier with a configurable [`ClassifierPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    policy: ClassifierPolicy,
}

impl Classifier {
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self { policy }
    }

    /// Rules apply in order; the first match wins:
    /// network → 401/403 → 5xx → validation → other 4xx → unknown.
    pub fn classify(&self, failure: &Failure, online: bool) -> Classification {
        let (category, severity, recoverable) = if Self::is_network(failure, online) {
            (ErrorCategory::Network, ErrorSeverity::Warning, true)
        } else {
            match failure.status() {
                Some(401) => (
                    ErrorCategory::Authentication,
                    ErrorSeverity::Warning,
                    self.policy.auth_recoverable,
                ),
                Some(403) => (
                    ErrorCategory::Authorization,
                    ErrorSeverity::Warning,
                    self.policy.auth_recoverable,
                ),
                Some(status) if status >= 500 => {
                    (ErrorCategory::Server, ErrorSeverity::Critical, true)
                }
                _ if Self::is_validation(failure) => {
                    (ErrorCategory::Validation, ErrorSeverity::Warning, false)
                }
                Some(status) if (400..500).contains(&status) => {
                    (ErrorCategory::Client, ErrorSeverity::Warning, false)
                }
                _ => (ErrorCategory::Unknown, ErrorSeverity::Warning, false),
            }
        };

        let severity = if failure.is_critical() {
            ErrorSeverity::Critical
        } else {
            severity
        };

        Classification {
            category,
            severity,
            recoverable,
        }
    }

    fn is_network(failure: &Failure, online: bool) -> bool {
        !online
            || matches!(
                failure.kind(),
                FailureKind::Network | FailureKind::Timeout | FailureKind::Aborted
            )
            || NETWORK_NAMES.contains(&failure.name())
            // A status means the server answered; the message is not a transport error
            || (failure.status().is_none() && pattern_matches(&NETWORK_MESSAGE, failure.message()))
    }

    fn is_validation(failure: &Failure) -> bool {
        failure.kind() == FailureKind::Validation
            || VALIDATION_NAMES.contains(&failure.name())
            || pattern_matches(&VALIDATION_MESSAGE, failure.message())
    }
}
