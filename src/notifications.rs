//! Turns classified errors into user-facing notifications.
//!
//! The factory only builds records. Inserting them into the store and
//! resolving their actions is the handler's job.

use reqwest::Url;

use crate::core_types::{
    ActionEffect, ActionStyle, ClassifiedError, ErrorCategory, ErrorNotification, ErrorSeverity,
    NotificationAction, NotificationLevel,
};

/// Builds [`ErrorNotification`]s. Messages never include stack traces.
#[derive(Debug, Clone)]
pub struct NotificationFactory {
    support_email: String,
}

impl NotificationFactory {
    pub fn new(support_email: impl Into<String>) -> Self {
        Self {
            support_email: support_email.into(),
        }
    }

    /// Notification for a freshly handled error.
    ///
    /// `has_retry_callback` decides whether a network "Retry" re-runs the
    /// caller's operation or falls back to a full reload.
    pub fn to_notification(
        &self,
        error: &ClassifiedError,
        has_retry_callback: bool,
    ) -> ErrorNotification {
        let error_id = Some(error.id().to_string());
        if error.category() == ErrorCategory::Server || error.severity() == ErrorSeverity::Critical {
            return Self::critical_notification(error, has_retry_callback);
        }
        match error.category() {
            ErrorCategory::Authentication => ErrorNotification::new(
                error_id,
                "Authentication Required",
                "Your session has expired or you are not signed in. Please sign in and try again.",
                NotificationLevel::Warning,
            ),
            ErrorCategory::Authorization => ErrorNotification::new(
                error_id,
                "Access Denied",
                "You don't have permission to perform this action.",
                NotificationLevel::Warning,
            ),
            ErrorCategory::Network => ErrorNotification::new(
                error_id,
                "Connection Problem",
                "We couldn't reach the server. Check your connection and try again.",
                NotificationLevel::Error,
            )
            .with_action(NotificationAction::new(
                "Retry",
                Self::retry_effect(has_retry_callback),
                ActionStyle::Primary,
            ))
            .persistent(true),
            category => {
                // Validation and client messages describe the user's input; keep them
                let message = match category {
                    ErrorCategory::Validation | ErrorCategory::Client
                        if !error.message().is_empty() =>
                    {
                        error.message().to_string()
                    }
                    _ => "An unexpected error occurred. Please try again.".to_string(),
                };
                ErrorNotification::new(error_id, "Error", message, NotificationLevel::Error)
                    .with_action(NotificationAction::new(
                        "Dismiss",
                        ActionEffect::Dismiss,
                        ActionStyle::Secondary,
                    ))
            }
        }
    }

    /// Server failures and anything marked critical. Always offers "Report
    /// Error"; a critical network failure also keeps its persistent retry.
    fn critical_notification(error: &ClassifiedError, has_retry_callback: bool) -> ErrorNotification {
        let mut notification = ErrorNotification::new(
            Some(error.id().to_string()),
            "Something Went Wrong",
            "A critical error occurred. You can report it to our team or refresh the page.",
            NotificationLevel::Critical,
        )
        .with_action(NotificationAction::new(
            "Report Error",
            ActionEffect::Report,
            ActionStyle::Secondary,
        ))
        .with_action(NotificationAction::new(
            "Refresh Page",
            ActionEffect::Reload,
            ActionStyle::Primary,
        ));

        // Without a callback "Retry" would only duplicate "Refresh Page"
        if error.category() == ErrorCategory::Network {
            if has_retry_callback {
                notification = notification.with_action(NotificationAction::new(
                    "Retry",
                    ActionEffect::Retry,
                    ActionStyle::Primary,
                ));
            }
            notification = notification.persistent(true);
        }
        notification
    }

    fn retry_effect(has_retry_callback: bool) -> ActionEffect {
        if has_retry_callback {
            ActionEffect::Retry
        } else {
            ActionEffect::Reload
        }
    }

    /// Notification produced by the `report` strategy, offering a support
    /// contact pre-filled with the error id, timestamp and message.
    pub fn report_notification(&self, error: &ClassifiedError) -> ErrorNotification {
        ErrorNotification::new(
            Some(error.id().to_string()),
            "Error Reported",
            format!(
                "Thanks for your patience. Reference ID: {}. Contact support if the problem persists.",
                error.id()
            ),
            NotificationLevel::Info,
        )
        .with_action(NotificationAction::new(
            "Contact Support",
            ActionEffect::ContactSupport {
                href: self.support_href(error),
            },
            ActionStyle::Primary,
        ))
        .persistent(true)
    }

    /// `mailto:` link with subject and body filled in
    pub fn support_href(&self, error: &ClassifiedError) -> String {
        let subject = format!("Error Report: {}", error.id());
        let body = format!(
            "Error ID: {}\nTime: {}\nMessage: {}\n\nWhat were you doing when this happened?\n",
            error.id(),
            error.timestamp().to_rfc3339(),
            error.message()
        );
        match Url::parse(&format!("mailto:{}", self.support_email)) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("subject", &subject)
                    .append_pair("body", &body);
                url.to_string()
            }
            Err(_) => format!("mailto:{}", self.support_email),
        }
    }
}
