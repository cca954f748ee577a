// Unit Tests for the Error State Store
//
// UNIT UNDER TEST: ErrorState / ErrorStore
//
// BUSINESS RESPONSIBILITY:
//   - Holds the single source of truth for errors, notifications and recovery progress
//   - Changes state only through ErrorAction, applied atomically in dispatch order
//   - Caps error history, evicting the oldest entries first
//   - Publishes each committed snapshot to subscribers
//
// TEST COVERAGE:
//   - History cap and last_error tracking
//   - Idempotent removals and unknown ids
//   - clear_errors resetting attempts
//   - Attempt counting only while recovering
//   - Subscriber notification on dispatch

use crate::core_types::{ErrorNotification, Failure, NotificationLevel};
use crate::store::{ErrorAction, ErrorState, ErrorStore};
use crate::tests::helpers::{capture, server_error};

fn notification(title: &str) -> ErrorNotification {
    ErrorNotification::new(None, title, "message", NotificationLevel::Info)
}

#[cfg(test)]
mod error_history_tests {
    use super::*;

    #[test]
    fn test_add_error_sets_last_error() {
        // Arrange
        let store = ErrorStore::new(50);
        let error = server_error();

        // Act
        store.add_error(error.clone());

        // Assert
        let state = store.snapshot();
        assert_eq!(state.errors, vec![error.clone()]);
        assert_eq!(state.last_error, Some(error));
    }

    #[test]
    fn test_history_cap_evicts_oldest_first() {
        // Test verifies the store never holds more than max_errors entries

        // Arrange
        let store = ErrorStore::new(3);
        let errors: Vec<_> = (0..5)
            .map(|i| capture(Failure::new(format!("failure {i}"))))
            .collect();

        // Act
        for error in &errors {
            store.add_error(error.clone());
        }

        // Assert
        let state = store.snapshot();
        assert_eq!(state.errors.len(), 3, "History should be capped at 3");
        assert_eq!(state.errors[0].message(), "failure 2");
        assert_eq!(state.errors[2].message(), "failure 4");
        assert_eq!(state.last_error.as_ref().map(|e| e.message()), Some("failure 4"));
    }

    #[test]
    fn test_remove_error_updates_last_error() {
        // Arrange
        let store = ErrorStore::new(50);
        let first = capture(Failure::new("first"));
        let second = capture(Failure::new("second"));
        store.add_error(first.clone());
        store.add_error(second.clone());

        // Act
        store.remove_error(second.id());

        // Assert
        let state = store.snapshot();
        assert_eq!(state.errors, vec![first.clone()]);
        assert_eq!(state.last_error, Some(first));
    }

    #[test]
    fn test_remove_unknown_error_is_noop() {
        // Arrange
        let store = ErrorStore::new(50);
        store.add_error(server_error());
        let before = store.snapshot();

        // Act
        store.remove_error("no-such-id");

        // Assert
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_clear_errors_resets_attempts_and_last_error() {
        // Arrange
        let store = ErrorStore::new(50);
        store.add_error(server_error());
        store.set_recovering(true);
        store.increment_recovery_attempts();
        store.increment_recovery_attempts();

        // Act
        store.clear_errors();

        // Assert
        let state = store.snapshot();
        assert!(state.errors.is_empty());
        assert!(state.last_error.is_none());
        assert_eq!(state.recovery_attempts, 0);
    }
}

#[cfg(test)]
mod notification_state_tests {
    use super::*;

    #[test]
    fn test_remove_notification_is_idempotent() {
        // Test verifies removing a notification twice leaves the same state as once

        // Arrange
        let store = ErrorStore::new(50);
        let kept = notification("kept");
        let removed = notification("removed");
        store.add_notification(kept.clone());
        store.add_notification(removed.clone());

        // Act
        store.remove_notification(&removed.id);
        let once = store.snapshot();
        store.remove_notification(&removed.id);
        let twice = store.snapshot();

        // Assert
        assert_eq!(once, twice);
        assert_eq!(twice.notifications, vec![kept]);
    }

    #[test]
    fn test_clear_notifications_leaves_errors() {
        // Arrange
        let store = ErrorStore::new(50);
        store.add_error(server_error());
        store.add_notification(notification("a"));

        // Act
        store.clear_notifications();

        // Assert
        let state = store.snapshot();
        assert!(state.notifications.is_empty());
        assert_eq!(state.errors.len(), 1);
    }
}

#[cfg(test)]
mod recovery_progress_tests {
    use super::*;

    #[test]
    fn test_attempts_only_count_while_recovering() {
        // Arrange
        let mut state = ErrorState::default();

        // Act
        state.apply(ErrorAction::IncrementRecoveryAttempts, 50);
        let idle_attempts = state.recovery_attempts;
        state.apply(ErrorAction::SetRecovering(true), 50);
        state.apply(ErrorAction::IncrementRecoveryAttempts, 50);

        // Assert
        assert_eq!(idle_attempts, 0, "Attempts outside a recovery are ignored");
        assert_eq!(state.recovery_attempts, 1);
    }

    #[test]
    fn test_reset_recovery_attempts() {
        // Arrange
        let mut state = ErrorState {
            is_recovering: true,
            recovery_attempts: 4,
            ..ErrorState::default()
        };

        // Act
        state.apply(ErrorAction::ResetRecoveryAttempts, 50);

        // Assert
        assert_eq!(state.recovery_attempts, 0);
        assert!(state.is_recovering, "Resetting attempts leaves the flag alone");
    }

    #[tokio::test]
    async fn test_subscribers_observe_dispatched_state() {
        // Arrange
        let store = ErrorStore::new(50);
        let mut receiver = store.subscribe();

        // Act
        store.set_recovering(true);

        // Assert
        receiver
            .changed()
            .await
            .expect("store should still be alive");
        assert!(receiver.borrow().is_recovering);
    }
}
