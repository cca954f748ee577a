//! The error handler façade.
//!
//! [`ErrorHandler`] owns one [`ErrorStore`] and everything needed to fill it:
//! a handled failure is enriched, classified, logged, stored, turned into a
//! notification and, when recoverable, handed to the recovery executor.

use futures_util::FutureExt;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::classifier::Classifier;
use crate::config::{HandlerConfig, RecoveryConfig, RecoveryOverrides};
use crate::core_types::{
    ActionEffect, ClassifiedError, ErrorNotification, Failure, FailureKind, RecoveryReport,
    RecoveryStrategy,
};
use crate::enricher::{ContextEnricher, ErrorContext};
use crate::error::{RecoveryError, RecoveryResult};
use crate::executor::{retry_operation, RecoveryExecutor, RetryOperation};
use crate::logging::{log_debug, log_warn, ErrorLogger, TracingErrorLogger};
use crate::notifications::NotificationFactory;
use crate::platform::{HeadlessPlatform, Platform};
use crate::retry::RetryScheduler;
use crate::store::{ErrorState, ErrorStore};

/// Handler for notification actions with a `Custom` effect
pub type ActionHandler = Arc<dyn Fn(&ErrorNotification) + Send + Sync>;

/// Per-call options for [`ErrorHandler::handle_error`].
#[derive(Clone, Default)]
pub struct HandleOptions {
    /// Name of the reporting unit
    pub component: Option<String>,
    pub context: Option<ErrorContext>,
    /// Merged over the handler's recovery configuration
    pub recovery: RecoveryOverrides,
    /// Skip the user notification
    pub silent: bool,
    /// Return the failure to the caller if recovery did not succeed
    pub rethrow: bool,
    /// Operation re-run by `retry` strategies and "Retry" actions
    pub retry: Option<RetryOperation>,
}

impl fmt::Debug for HandleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleOptions")
            .field("component", &self.component)
            .field("context", &self.context)
            .field("recovery", &self.recovery)
            .field("silent", &self.silent)
            .field("rethrow", &self.rethrow)
            .field("retry", &self.retry.is_some())
            .finish()
    }
}

impl HandleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add one key to the caller context
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn strategy(mut self, strategy: RecoveryStrategy) -> Self {
        self.recovery.strategy = Some(strategy);
        self
    }

    pub fn fallback(mut self, fallback: Option<RecoveryStrategy>) -> Self {
        self.recovery.fallback_strategy = Some(fallback);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.recovery.max_retries = Some(max_retries);
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.recovery.retry_delay = Some(retry_delay);
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn rethrow(mut self) -> Self {
        self.rethrow = true;
        self
    }

    pub fn retry(mut self, operation: RetryOperation) -> Self {
        self.retry = Some(operation);
        self
    }
}

/// Captures, classifies, notifies and recovers.
///
/// Dropping the handler cancels every pending retry timer.
pub struct ErrorHandler {
    config: HandlerConfig,
    platform: Arc<dyn Platform>,
    logger: Arc<dyn ErrorLogger>,
    store: Arc<ErrorStore>,
    scheduler: Arc<RetryScheduler>,
    classifier: Classifier,
    enricher: ContextEnricher,
    notifications: NotificationFactory,
    executor: RecoveryExecutor,
    retry_callbacks: Mutex<HashMap<String, RetryOperation>>,
    action_handlers: Mutex<HashMap<String, ActionHandler>>,
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("config", &self.config)
            .field("pending_retries", &self.scheduler.pending_count())
            .finish_non_exhaustive()
    }
}

impl ErrorHandler {
    /// Create a handler on a [`HeadlessPlatform`] logging through `tracing`
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if the configuration is invalid.
    pub fn from_config(config: HandlerConfig) -> RecoveryResult<Self> {
        Self::with_platform(
            config,
            Arc::new(HeadlessPlatform::new()),
            Arc::new(TracingErrorLogger),
        )
    }

    /// Create a handler using environment variables for configuration
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if an environment value is
    /// malformed or the resulting configuration is invalid.
    pub fn from_env() -> RecoveryResult<Self> {
        Self::from_config(HandlerConfig::from_env()?)
    }

    /// Create a handler on a host-provided platform and logging sink
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::ConfigurationError`] if the configuration is invalid.
    pub fn with_platform(
        config: HandlerConfig,
        platform: Arc<dyn Platform>,
        logger: Arc<dyn ErrorLogger>,
    ) -> RecoveryResult<Self> {
        config.validate()?;

        let store = Arc::new(ErrorStore::new(config.max_error_history));
        let scheduler = Arc::new(RetryScheduler::new(config.backoff.clone()));
        let notifications = NotificationFactory::new(config.support_email.clone());
        let executor = RecoveryExecutor::new(
            Arc::clone(&platform),
            Arc::clone(&store),
            Arc::clone(&scheduler),
            notifications.clone(),
            config.app_root.clone(),
        );

        log_debug!(
            strategy = %config.recovery.strategy,
            fallback = ?config.recovery.fallback_strategy,
            max_error_history = config.max_error_history,
            "ErrorHandler created"
        );

        Ok(Self {
            classifier: Classifier::new(config.classifier),
            enricher: ContextEnricher::new(Arc::clone(&platform)),
            config,
            platform,
            logger,
            store,
            scheduler,
            notifications,
            executor,
            retry_callbacks: Mutex::new(HashMap::new()),
            action_handlers: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    /// Handle a failure: log, store, notify and attempt recovery.
    ///
    /// # Errors
    ///
    /// Only with `rethrow` set: returns [`RecoveryError::Unrecovered`] when
    /// recovery did not succeed.
    pub async fn handle_error(
        &self,
        failure: impl Into<Failure>,
        options: HandleOptions,
    ) -> RecoveryResult<()> {
        let rethrow = options.rethrow;
        let (error, report) = self.process(failure.into(), options).await;
        let recovered = report.is_some_and(|r| r.succeeded);

        if rethrow && !recovered {
            return Err(RecoveryError::unrecovered(
                error.id(),
                error.category(),
                error.message(),
            ));
        }
        Ok(())
    }

    /// Run `operation`, handling any failure instead of returning it.
    ///
    /// Returns the resolved value, or `None` when the operation failed and
    /// recovery did not produce one. A `retry`/`retry_with_backoff` recovery
    /// re-runs `operation` and yields its value. Panics are handled as failures.
    ///
    /// # Errors
    ///
    /// Only with `rethrow` set: returns [`RecoveryError::Unrecovered`] when the
    /// operation failed and recovery did not produce a value.
    pub async fn handle_async_operation<T, E, F, Fut>(
        &self,
        operation: F,
        mut options: HandleOptions,
    ) -> RecoveryResult<Option<T>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Failure> + Send + 'static,
        T: Send + 'static,
    {
        let operation = Arc::new(operation);

        let failure = match run_caught(operation()).await {
            Ok(value) => return Ok(Some(value)),
            Err(failure) => failure,
        };

        let recovered: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
        if options.retry.is_none() {
            let operation = Arc::clone(&operation);
            let slot = Arc::clone(&recovered);
            options.retry = Some(retry_operation(move || {
                let attempt = operation();
                let slot = Arc::clone(&slot);
                async move {
                    let value = run_caught(attempt).await?;
                    *lock(&slot) = Some(value);
                    Ok(())
                }
            }));
        }

        let rethrow = options.rethrow;
        let (error, _) = self.process(failure, options).await;

        if let Some(value) = lock(&recovered).take() {
            return Ok(Some(value));
        }
        if rethrow {
            return Err(RecoveryError::unrecovered(
                error.id(),
                error.category(),
                error.message(),
            ));
        }
        Ok(None)
    }

    async fn process(
        &self,
        failure: Failure,
        options: HandleOptions,
    ) -> (ClassifiedError, Option<RecoveryReport>) {
        let mut config = options.recovery.apply(&self.config.recovery);
        if options.silent {
            config.show_user_notification = false;
        }
        let context = self.enricher.enrich(options.context);
        let online = context
            .connection
            .as_ref()
            .map_or_else(|| self.platform.is_online(), |c| c.online);
        let classification = self.classifier.classify(&failure, online);
        let error = ClassifiedError::capture(
            &failure,
            classification,
            options.component,
            context.browser_info(),
        );

        if config.log_error {
            self.logger.log_error(&error, &context);
        }
        self.store.add_error(error.clone());
        self.prune_retry_callbacks();

        // Persistent notifications stay until dismissed or resolved by a retry
        let mut persistent_notification = None;
        if config.show_user_notification {
            let notification = self
                .notifications
                .to_notification(&error, options.retry.is_some());
            // Callbacks live only as long as a notification can trigger them
            if let (true, Some(retry)) =
                (notification.offers(&ActionEffect::Retry), &options.retry)
            {
                lock(&self.retry_callbacks).insert(error.id().to_string(), Arc::clone(retry));
            }
            if notification.persistent {
                persistent_notification = Some(notification.id.clone());
            }
            self.store.add_notification(notification);
        }

        if !error.is_recoverable() {
            return (error, None);
        }

        let report = self
            .executor
            .execute_detailed(config.strategy, &error, &config, options.retry.as_ref())
            .await;

        let resolved_by_retry = report.succeeded
            && report
                .attempts
                .last()
                .is_some_and(|a| a.strategy.retries_operation());
        if resolved_by_retry {
            if let Some(id) = persistent_notification {
                self.store.remove_notification(&id);
            }
            lock(&self.retry_callbacks).remove(error.id());
        }

        (error, Some(report))
    }

    /// Resolve a notification action. Returns whether the action completed.
    pub async fn dispatch_action(&self, notification_id: &str, effect: &ActionEffect) -> bool {
        let Some(notification) = self
            .store
            .with_state(|state| state.find_notification(notification_id).cloned())
        else {
            log_debug!(notification_id = %notification_id, "Action for unknown notification");
            return false;
        };
        let error = notification.error_id.as_deref().and_then(|error_id| {
            self.store
                .with_state(|state| state.find_error(error_id).cloned())
        });

        match effect {
            ActionEffect::Dismiss => {
                self.dismiss_notification(notification_id);
                true
            }
            ActionEffect::Retry => {
                let Some(error) = error else {
                    return false;
                };
                let callback = lock(&self.retry_callbacks).get(error.id()).cloned();
                match callback {
                    Some(callback) => {
                        let recovered = self
                            .executor
                            .execute(
                                RecoveryStrategy::Retry,
                                &error,
                                &self.config.recovery,
                                Some(&callback),
                            )
                            .await;
                        if recovered {
                            self.dismiss_notification(notification_id);
                        }
                        recovered
                    }
                    None => {
                        self.platform.reload();
                        true
                    }
                }
            }
            ActionEffect::Reload => {
                self.platform.reload();
                true
            }
            ActionEffect::Report => match error {
                Some(error) => {
                    // The user asked for the report, so always show it
                    let config = RecoveryConfig {
                        show_user_notification: true,
                        ..self.config.recovery.clone()
                    };
                    self.executor
                        .execute(RecoveryStrategy::Report, &error, &config, None)
                        .await
                }
                None => false,
            },
            ActionEffect::NavigateHome => {
                self.platform.navigate_to(&self.config.app_root);
                true
            }
            ActionEffect::ContactSupport { href } => {
                self.platform.open_external(href);
                true
            }
            ActionEffect::Custom { handler_id } => {
                let handler = lock(&self.action_handlers).get(handler_id).cloned();
                match handler {
                    Some(handler) => {
                        handler(&notification);
                        true
                    }
                    None => {
                        log_warn!(handler_id = %handler_id, "No handler registered for custom action");
                        false
                    }
                }
            }
        }
    }

    /// Register the handler invoked for `ActionEffect::Custom { handler_id }`
    pub fn register_action_handler(&self, handler_id: impl Into<String>, handler: ActionHandler) {
        lock(&self.action_handlers).insert(handler_id.into(), handler);
    }

    /// Run a recovery strategy directly
    pub async fn execute_recovery_strategy(
        &self,
        strategy: RecoveryStrategy,
        error: &ClassifiedError,
        config: &RecoveryConfig,
        operation: Option<&RetryOperation>,
    ) -> bool {
        self.executor.execute(strategy, error, config, operation).await
    }

    /// Retry `operation` with this handler's backoff policy; see
    /// [`RetryScheduler::retry_with_backoff`]
    pub async fn retry_with_backoff<T, F, Fut>(
        &self,
        operation: F,
        error_id: &str,
        attempt: u32,
        max_retries: u32,
        base_delay: Duration,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.scheduler
            .retry_with_backoff(operation, error_id, attempt, max_retries, base_delay)
            .await
    }

    /// Remove a notification, releasing the retry callback it carried
    pub fn dismiss_notification(&self, notification_id: &str) {
        let retry_for = self.store.with_state(|state| {
            state
                .find_notification(notification_id)
                .filter(|n| n.offers(&ActionEffect::Retry))
                .and_then(|n| n.error_id.clone())
        });
        self.store.remove_notification(notification_id);
        if let Some(error_id) = retry_for {
            lock(&self.retry_callbacks).remove(&error_id);
        }
    }

    pub fn clear_notifications(&self) {
        lock(&self.retry_callbacks).clear();
        self.store.clear_notifications();
    }

    pub fn remove_error(&self, error_id: &str) {
        self.scheduler.cancel(error_id);
        lock(&self.retry_callbacks).remove(error_id);
        self.store.remove_error(error_id);
    }

    /// Cancel every pending retry, then clear errors and attempt counters
    pub fn clear_errors(&self) {
        self.scheduler.cancel_all();
        lock(&self.retry_callbacks).clear();
        self.store.clear_errors();
    }

    pub fn state(&self) -> ErrorState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ErrorState> {
        self.store.subscribe()
    }

    pub fn updates(&self) -> WatchStream<ErrorState> {
        self.store.updates()
    }

    pub fn pending_retries(&self) -> usize {
        self.scheduler.pending_count()
    }

    #[cfg(test)]
    pub(crate) fn retry_callback_count(&self) -> usize {
        lock(&self.retry_callbacks).len()
    }

    /// Drop callbacks whose error was evicted from the history
    fn prune_retry_callbacks(&self) {
        let live: HashSet<String> = self.store.with_state(|state| {
            state.errors.iter().map(|e| e.id().to_string()).collect()
        });
        lock(&self.retry_callbacks).retain(|error_id, _| live.contains(error_id));
    }

    /// Teardown: cancel pending retry timers
    pub fn shutdown(&self) {
        let cancelled = self.scheduler.cancel_all();
        log_debug!(cancelled = cancelled, "ErrorHandler shut down");
    }
}

impl Drop for ErrorHandler {
    fn drop(&mut self) {
        self.scheduler.cancel_all();
    }
}

/// Await `future`, turning both errors and panics into a [`Failure`]
async fn run_caught<T, E, Fut>(future: Fut) -> Result<T, Failure>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<Failure>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => Err(panic_failure(payload.as_ref())),
    }
}

pub(crate) fn panic_failure(payload: &(dyn std::any::Any + Send)) -> Failure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string());
    Failure::named("PanicError", message)
        .with_kind(FailureKind::Panic)
        .critical()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
