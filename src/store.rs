//! Error state store.
//!
//! State changes only through [`ErrorAction`]s applied by
//! [`ErrorState::apply`]. The store keeps the state in a `watch` channel so
//! every dispatch is applied atomically, in dispatch order, and subscribers see
//! each committed snapshot.

use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::core_types::{ClassifiedError, ErrorNotification};

/// Snapshot of errors, notifications and recovery progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    pub errors: Vec<ClassifiedError>,
    pub notifications: Vec<ErrorNotification>,
    pub is_recovering: bool,
    pub recovery_attempts: u32,
    pub last_error: Option<ClassifiedError>,
}

/// The only ways to change an [`ErrorState`]
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAction {
    AddError(ClassifiedError),
    RemoveError(String),
    ClearErrors,
    AddNotification(ErrorNotification),
    RemoveNotification(String),
    ClearNotifications,
    SetRecovering(bool),
    IncrementRecoveryAttempts,
    ResetRecoveryAttempts,
}

impl ErrorState {
    /// Apply one action. Total: unknown ids and redundant actions are no-ops.
    pub fn apply(&mut self, action: ErrorAction, max_errors: usize) {
        match action {
            ErrorAction::AddError(error) => {
                self.last_error = Some(error.clone());
                self.errors.push(error);
                if self.errors.len() > max_errors {
                    let overflow = self.errors.len() - max_errors;
                    self.errors.drain(..overflow);
                }
            }
            ErrorAction::RemoveError(id) => {
                self.errors.retain(|e| e.id() != id);
                if self.last_error.as_ref().is_some_and(|e| e.id() == id) {
                    self.last_error = self.errors.last().cloned();
                }
            }
            ErrorAction::ClearErrors => {
                self.errors.clear();
                self.last_error = None;
                self.recovery_attempts = 0;
            }
            ErrorAction::AddNotification(notification) => {
                self.notifications.push(notification);
            }
            ErrorAction::RemoveNotification(id) => {
                self.notifications.retain(|n| n.id != id);
            }
            ErrorAction::ClearNotifications => self.notifications.clear(),
            ErrorAction::SetRecovering(recovering) => self.is_recovering = recovering,
            ErrorAction::IncrementRecoveryAttempts => {
                // Attempts only count inside a recovery
                if self.is_recovering {
                    self.recovery_attempts = self.recovery_attempts.saturating_add(1);
                }
            }
            ErrorAction::ResetRecoveryAttempts => self.recovery_attempts = 0,
        }
    }

    pub fn find_error(&self, id: &str) -> Option<&ClassifiedError> {
        self.errors.iter().find(|e| e.id() == id)
    }

    pub fn find_notification(&self, id: &str) -> Option<&ErrorNotification> {
        self.notifications.iter().find(|n| n.id == id)
    }
}

/// Shared, subscribable holder of an [`ErrorState`].
#[derive(Debug)]
pub struct ErrorStore {
    state: watch::Sender<ErrorState>,
    max_errors: usize,
}

impl ErrorStore {
    pub fn new(max_errors: usize) -> Self {
        let (state, _) = watch::channel(ErrorState::default());
        Self {
            state,
            max_errors: max_errors.max(1),
        }
    }

    pub fn dispatch(&self, action: ErrorAction) {
        self.state
            .send_modify(|state| state.apply(action, self.max_errors));
    }

    pub fn snapshot(&self) -> ErrorState {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it
    pub fn with_state<R>(&self, read: impl FnOnce(&ErrorState) -> R) -> R {
        read(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<ErrorState> {
        self.state.subscribe()
    }

    /// Stream of snapshots, starting with the current one
    pub fn updates(&self) -> WatchStream<ErrorState> {
        WatchStream::new(self.subscribe())
    }

    pub fn add_error(&self, error: ClassifiedError) {
        self.dispatch(ErrorAction::AddError(error));
    }

    pub fn remove_error(&self, id: &str) {
        self.dispatch(ErrorAction::RemoveError(id.to_string()));
    }

    pub fn clear_errors(&self) {
        self.dispatch(ErrorAction::ClearErrors);
    }

    pub fn add_notification(&self, notification: ErrorNotification) {
        self.dispatch(ErrorAction::AddNotification(notification));
    }

    pub fn remove_notification(&self, id: &str) {
        self.dispatch(ErrorAction::RemoveNotification(id.to_string()));
    }

    pub fn clear_notifications(&self) {
        self.dispatch(ErrorAction::ClearNotifications);
    }

    pub fn set_recovering(&self, recovering: bool) {
        self.dispatch(ErrorAction::SetRecovering(recovering));
    }

    pub fn increment_recovery_attempts(&self) {
        self.dispatch(ErrorAction::IncrementRecoveryAttempts);
    }

    pub fn reset_recovery_attempts(&self) {
        self.dispatch(ErrorAction::ResetRecoveryAttempts);
    }
}
