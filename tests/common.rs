//! Test helper utilities for error-recovery integration tests
//!
//! This module provides a recording platform and handler fixtures that are
//! shared across integration test files.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use async_trait::async_trait;
use error_recovery::{
    ConnectionInfo, ErrorHandler, HandlerConfig, MemorySnapshot, Platform, RecoveryResult,
    TimingSnapshot, TracingErrorLogger, Viewport,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Platform fake that records every effect the engine requests.
#[derive(Debug)]
pub struct RecordingPlatform {
    online: AtomicBool,
    reloads: AtomicU32,
    cache_clears: AtomicU32,
    navigations: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            reloads: AtomicU32::new(0),
            cache_clears: AtomicU32::new(0),
            navigations: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn offline() -> Arc<Self> {
        let platform = Self::online();
        platform.set_online(false);
        platform
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn cache_clears(&self) -> u32 {
        self.cache_clears.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("navigations lock").clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opened lock").clone()
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        Some(ConnectionInfo {
            online: self.is_online(),
            effective_type: Some("4g".to_string()),
            downlink_mbps: Some(10.0),
            rtt_ms: Some(50),
        })
    }

    fn viewport(&self) -> Option<Viewport> {
        Some(Viewport {
            width: 1280,
            height: 720,
        })
    }

    fn user_agent(&self) -> Option<String> {
        Some("RecordingPlatform/1.0".to_string())
    }

    fn current_url(&self) -> Option<String> {
        Some("https://app.example.com/dashboard".to_string())
    }

    fn memory(&self) -> Option<MemorySnapshot> {
        None
    }

    fn timing(&self) -> Option<TimingSnapshot> {
        None
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn navigate_back(&self) -> bool {
        false
    }

    fn navigate_to(&self, path: &str) {
        self.navigations
            .lock()
            .expect("navigations lock")
            .push(path.to_string());
    }

    fn open_external(&self, href: &str) {
        self.opened.lock().expect("opened lock").push(href.to_string());
    }

    async fn clear_caches(&self) -> RecoveryResult<()> {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler on `platform` with the given configuration
pub fn create_handler(config: HandlerConfig, platform: &Arc<RecordingPlatform>) -> Arc<ErrorHandler> {
    let platform: Arc<dyn Platform> = Arc::clone(platform) as Arc<dyn Platform>;
    let handler = ErrorHandler::with_platform(config, platform, Arc::new(TracingErrorLogger))
        .expect("test configuration is valid");
    Arc::new(handler)
}

/// Default configuration with a short backoff base delay
pub fn create_fast_config() -> HandlerConfig {
    let mut config = HandlerConfig::default();
    config.recovery.retry_delay = Duration::from_millis(10);
    config
}
