//! Host platform capabilities.
//!
//! Everything the engine needs from its environment goes through [`Platform`]:
//! online status and diagnostics for enrichment, and the effectful calls the
//! recovery strategies make (reload, navigation, cache invalidation). Hosts
//! with a real browser or UI shell implement it; [`HeadlessPlatform`] serves
//! CLIs, services and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::core_types::Viewport;
use crate::error::RecoveryResult;
use crate::logging::{log_debug, log_info};

/// Network connection details, where the host exposes them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub online: bool,
    /// e.g. "4g", "3g", "slow-2g"
    pub effective_type: Option<String>,
    /// Estimated downlink in Mbit/s
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub used_bytes: u64,
    pub total_bytes: Option<u64>,
    pub limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingSnapshot {
    /// Time since the host started (page load, process start)
    pub uptime_ms: u64,
    pub load_time_ms: Option<u64>,
}

/// Capabilities the engine requires from its host.
///
/// Read methods must be cheap and synchronous; each may return `None` when the
/// host has no such API. Effectful methods back the recovery strategies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    fn is_online(&self) -> bool;

    fn connection(&self) -> Option<ConnectionInfo>;

    fn viewport(&self) -> Option<Viewport>;

    fn user_agent(&self) -> Option<String>;

    fn current_url(&self) -> Option<String>;

    fn memory(&self) -> Option<MemorySnapshot>;

    fn timing(&self) -> Option<TimingSnapshot>;

    /// Full reload of the host
    fn reload(&self);

    /// Pop one history entry; `false` when there is none
    fn navigate_back(&self) -> bool;

    fn navigate_to(&self, path: &str);

    /// Open an external link such as a `mailto:` support contact
    fn open_external(&self, href: &str);

    /// Invalidate every client-side cache
    async fn clear_caches(&self) -> RecoveryResult<()>;
}

/// [`Platform`] for hosts without a browser.
///
/// Online status is whatever was last set; navigation has no history, and
/// reload/navigation requests are counted and logged.
#[derive(Debug)]
pub struct HeadlessPlatform {
    online: AtomicBool,
    started: Instant,
    user_agent: String,
    reloads: AtomicU64,
    navigations: AtomicU64,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            started: Instant::now(),
            user_agent: format!("error-recovery/{}", env!("CARGO_PKG_VERSION")),
            reloads: AtomicU64::new(0),
            navigations: AtomicU64::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn navigation_count(&self) -> u64 {
        self.navigations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for HeadlessPlatform {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        Some(ConnectionInfo {
            online: self.is_online(),
            effective_type: None,
            downlink_mbps: None,
            rtt_ms: None,
        })
    }

    fn viewport(&self) -> Option<Viewport> {
        None
    }

    fn user_agent(&self) -> Option<String> {
        Some(self.user_agent.clone())
    }

    fn current_url(&self) -> Option<String> {
        None
    }

    fn memory(&self) -> Option<MemorySnapshot> {
        None
    }

    fn timing(&self) -> Option<TimingSnapshot> {
        let uptime_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Some(TimingSnapshot {
            uptime_ms,
            load_time_ms: None,
        })
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        log_info!(platform = "headless", "Reload requested");
    }

    fn navigate_back(&self) -> bool {
        log_debug!(platform = "headless", "No history to navigate back to");
        false
    }

    fn navigate_to(&self, path: &str) {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        log_info!(platform = "headless", path = %path, "Navigation requested");
    }

    fn open_external(&self, href: &str) {
        log_info!(platform = "headless", href = %href, "External link requested");
    }

    async fn clear_caches(&self) -> RecoveryResult<()> {
        log_debug!(platform = "headless", "No caches to clear");
        Ok(())
    }
}
