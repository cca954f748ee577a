use crate::core_types::RecoveryStrategy;
use crate::error::{RecoveryError, RecoveryResult};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recovery behaviour applied to a handled failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Primary strategy for recoverable errors
    pub strategy: RecoveryStrategy,
    /// Retries after the initial attempt for `retry_with_backoff`
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_delay: Duration,
    /// Strategy attempted once if the primary one fails
    pub fallback_strategy: Option<RecoveryStrategy>,
    /// Also gates the notification pushed by the `report` strategy
    pub show_user_notification: bool,
    pub log_error: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            strategy: RecoveryStrategy::Retry,
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            fallback_strategy: Some(RecoveryStrategy::Report),
            show_user_notification: true,
            log_error: true,
        }
    }
}

impl RecoveryConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if a backoff strategy is
    /// configured with a zero base delay.
    pub fn validate(&self) -> RecoveryResult<()> {
        if self.strategy == RecoveryStrategy::RetryWithBackoff && self.retry_delay.is_zero() {
            return Err(RecoveryError::configuration_error(
                "retry_delay must be greater than zero for retry_with_backoff",
            ));
        }
        Ok(())
    }
}

/// Per-call overrides merged field-wise over the handler's [`RecoveryConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryOverrides {
    pub strategy: Option<RecoveryStrategy>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    /// `Some(None)` disables the fallback for this call
    pub fallback_strategy: Option<Option<RecoveryStrategy>>,
    pub show_user_notification: Option<bool>,
    pub log_error: Option<bool>,
}

impl RecoveryOverrides {
    pub fn apply(&self, base: &RecoveryConfig) -> RecoveryConfig {
        RecoveryConfig {
            strategy: self.strategy.unwrap_or(base.strategy),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            retry_delay: self.retry_delay.unwrap_or(base.retry_delay),
            fallback_strategy: self.fallback_strategy.unwrap_or(base.fallback_strategy),
            show_user_notification: self
                .show_user_notification
                .unwrap_or(base.show_user_notification),
            log_error: self.log_error.unwrap_or(base.log_error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Timing rules for the retry-with-backoff primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add up to `jitter_ratio` of extra delay; off by default
    pub jitter: bool,
    pub jitter_ratio: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
            jitter_ratio: 0.1,
        }
    }
}

/// Classification knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Treat 401/403 as recoverable (e.g. when a token refresh is wired in)
    pub auth_recoverable: bool,
}

/// Handler-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub recovery: RecoveryConfig,
    pub backoff: BackoffPolicy,
    pub classifier: ClassifierPolicy,
    /// Oldest errors are evicted beyond this many
    pub max_error_history: usize,
    /// Recipient of pre-filled support reports
    pub support_email: String,
    /// Target of `navigate_home`
    pub app_root: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryConfig::default(),
            backoff: BackoffPolicy::default(),
            classifier: ClassifierPolicy::default(),
            max_error_history: 50,
            support_email: "support@example.com".to_string(),
            app_root: "/".to_string(),
        }
    }
}

impl HandlerConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if:
    /// - The recovery configuration is invalid
    /// - The fallback strategy equals the primary strategy
    /// - `max_error_history` is zero
    /// - The backoff multiplier is below 1.0 or the jitter ratio is outside `0.0..=1.0`
    /// - `support_email` is empty
    pub fn validate(&self) -> RecoveryResult<()> {
        self.recovery.validate()?;

        if self.recovery.fallback_strategy == Some(self.recovery.strategy) {
            return Err(RecoveryError::configuration_error(format!(
                "fallback_strategy must differ from strategy ({})",
                self.recovery.strategy
            )));
        }
        if self.max_error_history == 0 {
            return Err(RecoveryError::configuration_error(
                "max_error_history must be greater than zero",
            ));
        }
        if self.backoff.backoff_multiplier < 1.0 {
            return Err(RecoveryError::configuration_error(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                self.backoff.backoff_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.backoff.jitter_ratio) {
            return Err(RecoveryError::configuration_error(format!(
                "jitter_ratio must be within 0.0..=1.0, got {}",
                self.backoff.jitter_ratio
            )));
        }
        if self.support_email.trim().is_empty() {
            return Err(RecoveryError::configuration_error(
                "support_email is required",
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if a variable is set to a
    /// value that cannot be parsed or the resulting configuration is invalid.
    pub fn from_env() -> RecoveryResult<Self> {
        let mut config = Self::default();

        if let Ok(strategy) = std::env::var("ERROR_RECOVERY_STRATEGY") {
            config.recovery.strategy = strategy.parse()?;
        }
        if let Ok(fallback) = std::env::var("ERROR_RECOVERY_FALLBACK_STRATEGY") {
            config.recovery.fallback_strategy = match fallback.trim() {
                "" | "none" => None,
                other => Some(other.parse()?),
            };
        }
        if let Some(max_retries) = Self::parse_var::<u32>("ERROR_RECOVERY_MAX_RETRIES")? {
            config.recovery.max_retries = max_retries;
        }
        if let Some(delay_ms) = Self::parse_var::<u64>("ERROR_RECOVERY_RETRY_DELAY_MS")? {
            config.recovery.retry_delay = Duration::from_millis(delay_ms);
        }
        if let Some(jitter) = Self::parse_var::<bool>("ERROR_RECOVERY_BACKOFF_JITTER")? {
            config.backoff.jitter = jitter;
        }
        if let Ok(email) = std::env::var("ERROR_RECOVERY_SUPPORT_EMAIL") {
            config.support_email = email;
        }

        config.validate()?;

        log_debug!(
            strategy = %config.recovery.strategy,
            fallback = ?config.recovery.fallback_strategy,
            max_retries = config.recovery.max_retries,
            retry_delay_ms = config.recovery.retry_delay.as_millis(),
            jitter = config.backoff.jitter,
            "Error recovery configuration loaded from environment"
        );

        Ok(config)
    }

    fn parse_var<T: std::str::FromStr>(key: &str) -> RecoveryResult<Option<T>> {
        match std::env::var(key) {
            Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                RecoveryError::configuration_error(format!("Invalid value for {key}: {raw}"))
            }),
            Err(_) => Ok(None),
        }
    }
}
