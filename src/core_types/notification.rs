//! User-facing notification records.
//!
//! Actions carry a tagged [`ActionEffect`] instead of a callback so that the
//! store stays plain data: it can be cloned, compared, serialised and shown to
//! subscribers without holding onto closures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual treatment of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStyle {
    #[default]
    Primary,
    Secondary,
    Danger,
}

/// What happens when a notification action is chosen.
///
/// Resolved by `ErrorHandler::dispatch_action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEffect {
    /// Re-run the retry callback registered for the originating error
    Retry,
    /// Full reload of the host
    Reload,
    /// Run the `report` recovery strategy
    Report,
    /// Remove the notification
    Dismiss,
    NavigateHome,
    /// Open a pre-filled support contact link
    ContactSupport { href: String },
    /// Invoke a handler registered under `handler_id`
    Custom { handler_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub effect: ActionEffect,
    pub style: ActionStyle,
}

impl NotificationAction {
    pub fn new(label: impl Into<String>, effect: ActionEffect, style: ActionStyle) -> Self {
        Self {
            label: label.into(),
            effect,
            style,
        }
    }
}

/// A message surfaced to the user for a classified error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotification {
    pub id: String,
    /// Id of the error this notification was derived from
    pub error_id: Option<String>,
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
    pub actions: Vec<NotificationAction>,
    /// Survives auto-dismiss timers; removed only explicitly
    pub persistent: bool,
    pub created_at: DateTime<Utc>,
}

impl ErrorNotification {
    pub fn new(
        error_id: Option<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        level: NotificationLevel,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            error_id,
            title: title.into(),
            message: message.into(),
            level,
            actions: Vec::new(),
            persistent: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn action_labels(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.label.as_str()).collect()
    }

    /// Whether any action carries `effect`
    pub fn offers(&self, effect: &ActionEffect) -> bool {
        self.actions.iter().any(|a| &a.effect == effect)
    }
}
