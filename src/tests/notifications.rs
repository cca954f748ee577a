// Unit Tests for Notification Construction
//
// UNIT UNDER TEST: NotificationFactory
//
// BUSINESS RESPONSIBILITY:
//   - Produces one user-facing notification per classified error
//   - Chooses title, level and actions by category and severity
//   - Keeps network notifications persistent until dismissed or retried
//   - Never leaks stack traces into user-visible text
//   - Builds pre-filled support contact links for error reports
//
// TEST COVERAGE:
//   - Category → notification mapping, with critical severity overriding category
//   - Retry action effect with and without a registered retry callback
//   - Validation messages passed through, unknown messages replaced
//   - Support mailto link contents

use crate::core_types::{
    ActionEffect, ActionStyle, ErrorCategory, ErrorSeverity, Failure, NotificationLevel,
};
use crate::notifications::NotificationFactory;
use crate::tests::helpers::{capture, network_error, server_error};

fn factory() -> NotificationFactory {
    NotificationFactory::new("help@example.com")
}

#[cfg(test)]
mod category_notification_tests {
    use super::*;

    #[test]
    fn test_network_notification_is_persistent_with_retry() {
        // Arrange
        let error = network_error();

        // Act
        let notification = factory().to_notification(&error, true);

        // Assert
        assert_eq!(notification.title, "Connection Problem");
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.persistent, "Network notifications must persist");
        assert_eq!(notification.action_labels(), vec!["Retry"]);
        assert!(notification.offers(&ActionEffect::Retry));
        assert_eq!(notification.error_id.as_deref(), Some(error.id()));
    }

    #[test]
    fn test_network_retry_falls_back_to_reload_without_callback() {
        // Arrange
        let error = network_error();

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.action_labels(), vec!["Retry"]);
        assert!(notification.offers(&ActionEffect::Reload));
        assert!(!notification.offers(&ActionEffect::Retry));
    }

    #[test]
    fn test_server_error_offers_report_and_refresh() {
        // Arrange
        let error = server_error();

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.level, NotificationLevel::Critical);
        assert_eq!(notification.action_labels(), vec!["Report Error", "Refresh Page"]);
        assert_eq!(notification.actions[0].style, ActionStyle::Secondary);
        assert_eq!(notification.actions[1].style, ActionStyle::Primary);
        assert!(!notification.persistent);
    }

    #[test]
    fn test_critical_unknown_error_uses_critical_notification() {
        // Arrange
        let error = capture(Failure::new("state corrupted").critical());
        assert_eq!(error.severity(), ErrorSeverity::Critical);

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.level, NotificationLevel::Critical);
        assert!(notification.offers(&ActionEffect::Report));
    }

    #[test]
    fn test_critical_network_error_offers_report_and_keeps_retry() {
        // Test verifies a caller-marked critical network failure gets the
        // critical treatment without losing its persistent retry

        // Arrange
        let error = capture(Failure::network("Failed to fetch").critical());
        assert_eq!(error.category(), ErrorCategory::Network);

        // Act
        let notification = factory().to_notification(&error, true);

        // Assert
        assert_eq!(notification.title, "Something Went Wrong");
        assert_eq!(notification.level, NotificationLevel::Critical);
        assert_eq!(
            notification.action_labels(),
            vec!["Report Error", "Refresh Page", "Retry"]
        );
        assert!(notification.offers(&ActionEffect::Report));
        assert!(notification.offers(&ActionEffect::Retry));
        assert!(notification.persistent);
    }

    #[test]
    fn test_critical_network_error_without_callback_has_no_duplicate_reload() {
        // Arrange
        let error = capture(Failure::network("Failed to fetch").critical());

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.action_labels(), vec!["Report Error", "Refresh Page"]);
        assert!(notification.persistent);
    }

    #[test]
    fn test_critical_auth_error_offers_report() {
        // Arrange
        let error = capture(Failure::http(401, "expired").critical());
        assert_eq!(error.category(), ErrorCategory::Authentication);
        assert_eq!(error.severity(), ErrorSeverity::Critical);

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.level, NotificationLevel::Critical);
        assert!(notification.offers(&ActionEffect::Report));
        assert!(!notification.persistent);
    }

    #[test]
    fn test_auth_notifications_have_no_actions() {
        // Arrange
        let unauthorized = capture(Failure::http(401, "Unauthorized"));
        let forbidden = capture(Failure::http(403, "Forbidden"));

        // Act
        let sign_in = factory().to_notification(&unauthorized, true);
        let denied = factory().to_notification(&forbidden, true);

        // Assert
        assert_eq!(sign_in.title, "Authentication Required");
        assert_eq!(sign_in.level, NotificationLevel::Warning);
        assert!(sign_in.actions.is_empty());
        assert_eq!(denied.title, "Access Denied");
        assert!(denied.actions.is_empty());
    }

    #[test]
    fn test_validation_message_is_shown_to_user() {
        // Arrange
        let error = capture(Failure::validation("Email address is invalid"));
        assert_eq!(error.category(), ErrorCategory::Validation);

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert_eq!(notification.message, "Email address is invalid");
        assert_eq!(notification.action_labels(), vec!["Dismiss"]);
    }

    #[test]
    fn test_unknown_error_message_and_stack_are_hidden() {
        // Arrange
        let error = capture(
            Failure::new("NullPointer in renderer").with_stack("at render (app.js:10:3)"),
        );

        // Act
        let notification = factory().to_notification(&error, false);

        // Assert
        assert!(!notification.message.contains("NullPointer"));
        assert!(!notification.message.contains("app.js"));
        assert_eq!(notification.title, "Error");
    }
}

#[cfg(test)]
mod report_notification_tests {
    use super::*;

    #[test]
    fn test_report_notification_links_support_with_error_id() {
        // Arrange
        let error = server_error();

        // Act
        let notification = factory().report_notification(&error);

        // Assert
        assert_eq!(notification.level, NotificationLevel::Info);
        assert!(notification.persistent);
        assert!(notification.message.contains(error.id()));
        match &notification.actions[0].effect {
            ActionEffect::ContactSupport { href } => {
                assert!(href.starts_with("mailto:help@example.com?"));
                assert!(href.contains(error.id()));
                assert!(href.contains("subject="));
            }
            other => panic!("Expected ContactSupport, got {other:?}"),
        }
    }
}
