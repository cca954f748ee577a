//! Recovery strategy names and per-execution records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RecoveryError;

/// A named recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Re-invoke the supplied operation once
    Retry,
    /// Re-invoke with exponential backoff up to `max_retries`
    RetryWithBackoff,
    Reload,
    NavigateBack,
    NavigateHome,
    /// Invalidate client-side caches, then reload
    ClearCache,
    /// Offer a pre-filled support contact
    Report,
    Ignore,
}

impl RecoveryStrategy {
    pub const ALL: [RecoveryStrategy; 8] = [
        RecoveryStrategy::Retry,
        RecoveryStrategy::RetryWithBackoff,
        RecoveryStrategy::Reload,
        RecoveryStrategy::NavigateBack,
        RecoveryStrategy::NavigateHome,
        RecoveryStrategy::ClearCache,
        RecoveryStrategy::Report,
        RecoveryStrategy::Ignore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::Retry => "retry",
            RecoveryStrategy::RetryWithBackoff => "retry_with_backoff",
            RecoveryStrategy::Reload => "reload",
            RecoveryStrategy::NavigateBack => "navigate_back",
            RecoveryStrategy::NavigateHome => "navigate_home",
            RecoveryStrategy::ClearCache => "clear_cache",
            RecoveryStrategy::Report => "report",
            RecoveryStrategy::Ignore => "ignore",
        }
    }

    /// Whether the strategy re-invokes the caller's operation
    pub fn retries_operation(&self) -> bool {
        matches!(
            self,
            RecoveryStrategy::Retry | RecoveryStrategy::RetryWithBackoff
        )
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecoveryStrategy {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        RecoveryStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| {
                RecoveryError::configuration_error(format!(
                    "Unknown recovery strategy: {s}. Supported strategies: retry, retry_with_backoff, reload, navigate_back, navigate_home, clear_cache, report, ignore"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    Success,
    Failure,
    FallbackInvoked,
}

/// One execution of a recovery strategy within a recovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    pub strategy: RecoveryStrategy,
    pub error_id: String,
    pub attempt_number: u32,
    pub outcome: RecoveryOutcome,
}

/// Executor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryState {
    Idle,
    Recovering,
    Succeeded,
    Failed,
    FallbackExhausted,
}

/// Result of one recovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub succeeded: bool,
    pub final_state: RecoveryState,
    pub attempts: Vec<RecoveryAttempt>,
}
