//! Recovery strategy execution.
//!
//! One call to [`RecoveryExecutor::execute_detailed`] is one recovery cycle:
//! idle → recovering → succeeded | failed | fallback_exhausted. The primary
//! strategy runs first; if it errors and a different fallback is configured,
//! the fallback runs exactly once.

use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::RecoveryConfig;
use crate::core_types::{
    ClassifiedError, Failure, RecoveryAttempt, RecoveryOutcome, RecoveryReport, RecoveryState,
    RecoveryStrategy,
};
use crate::error::{RecoveryError, RecoveryResult};
use crate::logging::{log_debug, log_info, log_warn};
use crate::notifications::NotificationFactory;
use crate::platform::Platform;
use crate::retry::RetryScheduler;
use crate::store::ErrorStore;

/// A re-invocable operation, as handed to `retry` strategies and retry actions
pub type RetryOperation = Arc<dyn Fn() -> BoxFuture<'static, Result<(), Failure>> + Send + Sync>;

/// Wrap an async closure as a [`RetryOperation`]
pub fn retry_operation<F, Fut>(operation: F) -> RetryOperation
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), Failure>> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, Result<(), Failure>> { Box::pin(operation()) })
}

/// Runs recovery strategies against a platform and store.
pub struct RecoveryExecutor {
    platform: Arc<dyn Platform>,
    store: Arc<ErrorStore>,
    scheduler: Arc<RetryScheduler>,
    notifications: NotificationFactory,
    app_root: String,
    /// Recoveries in flight
    active: Mutex<usize>,
}

impl RecoveryExecutor {
    pub fn new(
        platform: Arc<dyn Platform>,
        store: Arc<ErrorStore>,
        scheduler: Arc<RetryScheduler>,
        notifications: NotificationFactory,
        app_root: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            store,
            scheduler,
            notifications,
            app_root: app_root.into(),
            active: Mutex::new(0),
        }
    }

    /// Run `strategy` for `error`; `true` when the recovery action completed.
    pub async fn execute(
        &self,
        strategy: RecoveryStrategy,
        error: &ClassifiedError,
        config: &RecoveryConfig,
        operation: Option<&RetryOperation>,
    ) -> bool {
        self.execute_detailed(strategy, error, config, operation)
            .await
            .succeeded
    }

    pub async fn execute_detailed(
        &self,
        strategy: RecoveryStrategy,
        error: &ClassifiedError,
        config: &RecoveryConfig,
        operation: Option<&RetryOperation>,
    ) -> RecoveryReport {
        let _recovering = RecoveringGuard::acquire(&self.store, &self.active);
        let mut attempts = Vec::new();

        log_debug!(
            error_id = %error.id(),
            strategy = %strategy,
            fallback = ?config.fallback_strategy,
            state = ?RecoveryState::Recovering,
            "Starting recovery"
        );

        let primary = self.run_strategy(strategy, error, config, operation).await;
        if let Err(RecoveryError::RetryCancelled { .. }) = primary {
            // Torn down mid-backoff: nothing to record, nothing to fall back for
            log_debug!(error_id = %error.id(), strategy = %strategy, "Recovery cancelled");
            return RecoveryReport {
                succeeded: false,
                final_state: RecoveryState::Failed,
                attempts,
            };
        }
        let attempt_number = self.record_attempt();

        let (succeeded, final_state) = match primary {
            Ok(completed) => {
                attempts.push(RecoveryAttempt {
                    strategy,
                    error_id: error.id().to_string(),
                    attempt_number,
                    outcome: Self::outcome(completed),
                });
                (completed, Self::terminal(completed))
            }
            Err(primary_error) => match config.fallback_strategy {
                Some(fallback) if fallback != strategy => {
                    attempts.push(RecoveryAttempt {
                        strategy,
                        error_id: error.id().to_string(),
                        attempt_number,
                        outcome: RecoveryOutcome::FallbackInvoked,
                    });
                    log_info!(
                        error_id = %error.id(),
                        strategy = %strategy,
                        fallback = %fallback,
                        error = %primary_error,
                        "Primary recovery failed, attempting fallback"
                    );

                    let fallback_result =
                        self.run_strategy(fallback, error, config, operation).await;
                    let attempt_number = self.record_attempt();
                    let completed = match fallback_result {
                        Ok(completed) => completed,
                        Err(fallback_error) => {
                            log_warn!(
                                error_id = %error.id(),
                                fallback = %fallback,
                                error = %fallback_error,
                                "Fallback recovery failed"
                            );
                            false
                        }
                    };
                    attempts.push(RecoveryAttempt {
                        strategy: fallback,
                        error_id: error.id().to_string(),
                        attempt_number,
                        outcome: Self::outcome(completed),
                    });
                    let state = if completed {
                        RecoveryState::Succeeded
                    } else {
                        RecoveryState::FallbackExhausted
                    };
                    (completed, state)
                }
                _ => {
                    attempts.push(RecoveryAttempt {
                        strategy,
                        error_id: error.id().to_string(),
                        attempt_number,
                        outcome: RecoveryOutcome::Failure,
                    });
                    log_warn!(
                        error_id = %error.id(),
                        strategy = %strategy,
                        error = %primary_error,
                        "Recovery failed with no fallback"
                    );
                    (false, RecoveryState::Failed)
                }
            },
        };

        if succeeded {
            self.store.reset_recovery_attempts();
        }

        log_debug!(
            error_id = %error.id(),
            succeeded = succeeded,
            state = ?final_state,
            attempts = attempts.len(),
            "Recovery finished"
        );

        RecoveryReport {
            succeeded,
            final_state,
            attempts,
        }
    }

    /// Perform a single strategy. `Err` means the strategy threw and a fallback
    /// may apply, except for `RetryCancelled`; `Ok(false)` means it completed
    /// without recovering.
    async fn run_strategy(
        &self,
        strategy: RecoveryStrategy,
        error: &ClassifiedError,
        config: &RecoveryConfig,
        operation: Option<&RetryOperation>,
    ) -> RecoveryResult<bool> {
        match strategy {
            RecoveryStrategy::Retry => match operation {
                Some(operation) => operation().await.map(|()| true).map_err(|failure| {
                    RecoveryError::strategy_failed(strategy, failure.to_string())
                }),
                None => {
                    log_debug!(error_id = %error.id(), "No operation to retry");
                    Ok(false)
                }
            },
            RecoveryStrategy::RetryWithBackoff => match operation {
                Some(operation) => self
                    .scheduler
                    .retry_with_backoff(
                        || operation(),
                        error.id(),
                        0,
                        config.max_retries,
                        config.retry_delay,
                    )
                    .await
                    .map(|()| true),
                None => {
                    log_debug!(error_id = %error.id(), "No operation to retry");
                    Ok(false)
                }
            },
            RecoveryStrategy::Reload => {
                self.platform.reload();
                Ok(true)
            }
            RecoveryStrategy::NavigateBack => Ok(self.platform.navigate_back()),
            RecoveryStrategy::NavigateHome => {
                self.platform.navigate_to(&self.app_root);
                Ok(true)
            }
            RecoveryStrategy::ClearCache => {
                if let Err(cache_error) = self.platform.clear_caches().await {
                    log_warn!(
                        error_id = %error.id(),
                        error = %cache_error,
                        "Cache clearing failed, reloading anyway"
                    );
                }
                self.platform.reload();
                Ok(true)
            }
            RecoveryStrategy::Report => {
                if config.show_user_notification {
                    self.store
                        .add_notification(self.notifications.report_notification(error));
                    log_info!(error_id = %error.id(), "Error report offered to user");
                } else {
                    log_info!(error_id = %error.id(), "Error reported without notification");
                }
                Ok(true)
            }
            RecoveryStrategy::Ignore => Ok(true),
        }
    }

    fn record_attempt(&self) -> u32 {
        self.store.increment_recovery_attempts();
        self.store.with_state(|state| state.recovery_attempts)
    }

    fn outcome(completed: bool) -> RecoveryOutcome {
        if completed {
            RecoveryOutcome::Success
        } else {
            RecoveryOutcome::Failure
        }
    }

    fn terminal(completed: bool) -> RecoveryState {
        if completed {
            RecoveryState::Succeeded
        } else {
            RecoveryState::Failed
        }
    }
}

/// Holds `is_recovering` true while at least one recovery is in flight.
///
/// Released on every exit path, including panics and dropped futures.
struct RecoveringGuard<'a> {
    store: &'a ErrorStore,
    active: &'a Mutex<usize>,
}

impl<'a> RecoveringGuard<'a> {
    fn acquire(store: &'a ErrorStore, active: &'a Mutex<usize>) -> Self {
        let mut count = active.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        if *count == 1 {
            store.set_recovering(true);
        }
        drop(count);
        Self { store, active }
    }
}

impl Drop for RecoveringGuard<'_> {
    fn drop(&mut self) {
        let mut count = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.store.set_recovering(false);
        }
    }
}
