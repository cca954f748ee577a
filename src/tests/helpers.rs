//! Test helper utilities for error-recovery unit tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use crate::classifier::classify;
use crate::config::{BackoffPolicy, HandlerConfig};
use crate::core_types::{ClassifiedError, Failure};
use crate::executor::RecoveryExecutor;
use crate::notifications::NotificationFactory;
use crate::platform::MockPlatform;
use crate::retry::RetryScheduler;
use crate::store::ErrorStore;
use std::sync::Arc;

/// Mock platform that is online and reports no ambient diagnostics.
///
/// Effectful calls (reload, navigation, cache clearing) carry no expectations;
/// tests add the ones they exercise.
pub fn quiet_platform() -> MockPlatform {
    let mut platform = MockPlatform::new();
    platform.expect_is_online().return_const(true);
    platform.expect_connection().returning(|| None);
    platform.expect_viewport().returning(|| None);
    platform.expect_user_agent().returning(|| None);
    platform.expect_current_url().returning(|| None);
    platform.expect_memory().returning(|| None);
    platform.expect_timing().returning(|| None);
    platform
}

/// Capture `failure` the way the handler does while online
pub fn capture(failure: Failure) -> ClassifiedError {
    let classification = classify(&failure, true);
    ClassifiedError::capture(&failure, classification, Some("TestComponent".to_string()), None)
}

pub fn server_error() -> ClassifiedError {
    capture(Failure::http(500, "Internal Server Error"))
}

pub fn network_error() -> ClassifiedError {
    capture(Failure::network("Failed to fetch"))
}

/// Executor wired to `platform` with a fresh store and default backoff
pub fn executor_with(platform: MockPlatform) -> (RecoveryExecutor, Arc<ErrorStore>) {
    let store = Arc::new(ErrorStore::new(50));
    let executor = RecoveryExecutor::new(
        Arc::new(platform),
        Arc::clone(&store),
        Arc::new(RetryScheduler::new(BackoffPolicy::default())),
        NotificationFactory::new("support@example.com"),
        "/",
    );
    (executor, store)
}

/// Handler configuration with short delays so backoff tests stay fast
pub fn fast_config() -> HandlerConfig {
    let mut config = HandlerConfig::default();
    config.recovery.retry_delay = std::time::Duration::from_millis(10);
    config
}
