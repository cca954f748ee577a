//! Retry logic with exponential backoff and cancellable timers
//!
//! This module provides the retry-with-backoff primitive used by the
//! `retry_with_backoff` recovery strategy:
//! - Exponential backoff: `base_delay * 2^attempt`, capped at `max_delay` (10s)
//! - Optional jitter, off by default
//! - A distinct `MaxRetriesExceeded` error once the attempt cap is reached
//! - Every pending delay registered under its error id so it can be cancelled

use crate::config::BackoffPolicy;
use crate::core_types::Failure;
use crate::error::{RecoveryError, RecoveryResult};
use crate::logging::{log_debug, log_warn};

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;

#[derive(Debug)]
struct PendingRetry {
    ticket: u64,
    cancel: oneshot::Sender<()>,
}

/// Runs operations with exponential backoff and tracks pending delays.
///
/// Retries for different error ids proceed independently. Within one error id
/// a retry chain is sequential; starting a new chain for an id that already has
/// a pending delay cancels the older one.
#[derive(Debug, Default)]
pub struct RetryScheduler {
    policy: BackoffPolicy,
    pending: Mutex<HashMap<String, PendingRetry>>,
    next_ticket: AtomicU64,
}

impl RetryScheduler {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            pending: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-indexed)
    pub fn calculate_delay(&self, attempt: u32, base_delay: Duration) -> Duration {
        let max_secs = self.policy.max_delay.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let mut delay_secs = base_delay.as_secs_f64() * self.policy.backoff_multiplier.powi(exponent);

        if self.policy.jitter {
            // Spread out clients retrying in lockstep
            delay_secs *= 1.0 + fastrand::f64() * self.policy.jitter_ratio;
        }

        if !delay_secs.is_finite() || delay_secs > max_secs {
            return self.policy.max_delay;
        }
        // Policies built by hand skip validation; a negative factor means no wait
        Duration::from_secs_f64(delay_secs.max(0.0))
    }

    /// Run `operation`, retrying with backoff until it succeeds or
    /// `attempt >= max_retries` after a failure.
    ///
    /// `attempt` is the index of the first invocation, so a fresh chain starts
    /// at 0 and makes at most `max_retries + 1` calls.
    ///
    /// # Errors
    ///
    /// - [`RecoveryError::MaxRetriesExceeded`] once the cap is reached
    /// - [`RecoveryError::RetryCancelled`] if the pending delay is cancelled;
    ///   the operation is not invoked again
    pub async fn retry_with_backoff<T, F, Fut>(
        &self,
        mut operation: F,
        error_id: &str,
        mut attempt: u32,
        max_retries: u32,
        base_delay: Duration,
    ) -> RecoveryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        loop {
            log_debug!(
                error_id = %error_id,
                attempt = attempt,
                max_retries = max_retries,
                "Executing operation with backoff"
            );

            let failure = match operation().await {
                Ok(value) => {
                    log_debug!(error_id = %error_id, attempt = attempt, "Operation succeeded");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if attempt >= max_retries {
                return Err(RecoveryError::max_retries_exceeded(
                    error_id,
                    attempt.saturating_add(1),
                    failure.to_string(),
                ));
            }

            let delay = self.calculate_delay(attempt, base_delay);
            log_debug!(
                error_id = %error_id,
                attempt = attempt,
                delay_ms = delay.as_millis(),
                failure = %failure,
                "Operation failed, retrying after delay"
            );
            self.wait(error_id, delay).await?;
            attempt += 1;
        }
    }

    /// Cancel the pending delay for `error_id`. Returns whether one existed.
    pub fn cancel(&self, error_id: &str) -> bool {
        match self.lock().remove(error_id) {
            Some(pending) => {
                let _ = pending.cancel.send(());
                true
            }
            None => false,
        }
    }

    /// Cancel every pending delay; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingRetry> = self.lock().drain().map(|(_, p)| p).collect();
        let count = drained.len();
        for pending in drained {
            let _ = pending.cancel.send(());
        }
        if count > 0 {
            log_warn!(cancelled = count, "Cancelled pending retries");
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_pending(&self, error_id: &str) -> bool {
        self.lock().contains_key(error_id)
    }

    async fn wait(&self, error_id: &str, delay: Duration) -> RecoveryResult<()> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel();

        if let Some(superseded) = self
            .lock()
            .insert(error_id.to_string(), PendingRetry { ticket, cancel })
        {
            let _ = superseded.cancel.send(());
        }

        let _registration = Registration {
            scheduler: self,
            error_id,
            ticket,
        };

        tokio::select! {
            _ = sleep(delay) => Ok(()),
            // A send or a dropped sender both mean the timer was cleared
            _ = cancelled => Err(RecoveryError::retry_cancelled(error_id)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingRetry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its own registry entry when the wait ends or is dropped
struct Registration<'a> {
    scheduler: &'a RetryScheduler,
    error_id: &'a str,
    ticket: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut pending = self.scheduler.lock();
        if pending
            .get(self.error_id)
            .is_some_and(|p| p.ticket == self.ticket)
        {
            pending.remove(self.error_id);
        }
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
