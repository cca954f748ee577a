//! Ambient diagnostic context for captured errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::core_types::{BrowserInfo, Viewport};
use crate::logging::log_debug;
use crate::platform::{ConnectionInfo, MemorySnapshot, Platform, TimingSnapshot};

/// Caller-supplied context attached to a handled error
pub type ErrorContext = serde_json::Map<String, serde_json::Value>;

/// Caller context plus whatever the platform could report.
///
/// Every ambient field is optional and omitted from serialisation when the
/// platform had nothing to say.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedContext {
    #[serde(flatten)]
    pub base: ErrorContext,
    pub captured_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemorySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingSnapshot>,
}

impl EnhancedContext {
    /// Browser snapshot for the error record; needs at least a user agent and URL
    pub fn browser_info(&self) -> Option<BrowserInfo> {
        match (&self.user_agent, &self.url) {
            (Some(user_agent), Some(url)) => Some(BrowserInfo {
                user_agent: user_agent.clone(),
                url: url.clone(),
                viewport: self.viewport,
            }),
            _ => None,
        }
    }
}

/// Reads ambient diagnostics from a [`Platform`].
#[derive(Clone)]
pub struct ContextEnricher {
    platform: Arc<dyn Platform>,
}

impl ContextEnricher {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Never fails: a probe that panics contributes nothing.
    pub fn enrich(&self, base: Option<ErrorContext>) -> EnhancedContext {
        let platform = self.platform.as_ref();
        EnhancedContext {
            base: base.unwrap_or_default(),
            captured_at: Utc::now(),
            connection: probe("connection", || platform.connection()),
            viewport: probe("viewport", || platform.viewport()),
            user_agent: probe("user_agent", || platform.user_agent()),
            url: probe("url", || platform.current_url()),
            memory: probe("memory", || platform.memory()),
            timing: probe("timing", || platform.timing()),
        }
    }
}

fn probe<T>(field: &'static str, read: impl FnOnce() -> Option<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(read)) {
        Ok(value) => value,
        Err(_) => {
            log_debug!(field = field, "Context probe panicked, omitting field");
            None
        }
    }
}
