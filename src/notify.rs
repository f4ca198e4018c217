//! Caller-side notification policy
//!
//! The dispatcher never shows anything to the user. Callers hand terminal
//! errors to a [`NotificationGate`], which decides between ending the
//! session, showing a message keyed by error code, or staying quiet, and
//! forwards the decision to a [`Notifier`].

use crate::http::{is_critical, ClassifiedError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// UI collaborator rendering user-visible feedback
pub trait Notifier: Send + Sync {
    /// Show a message; `key` de-duplicates identical notifications
    fn show(&self, key: &str, error: &ClassifiedError);

    /// The session is no longer valid (e.g. force logout)
    fn session_expired(&self, error: &ClassifiedError);
}

/// What the gate decided for one error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    SessionExpired,
    Show { key: String },
    Suppressed(SuppressReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The request set `skip_error_notification`
    OptedOut,
    /// The caller cancelled the request itself
    Cancelled,
    /// Same code already shown inside the window
    Duplicate,
}

/// De-duplicating notification policy
#[derive(Debug)]
pub struct NotificationGate {
    window: Duration,
    last_shown: Mutex<HashMap<String, Instant>>,
}

impl Default for NotificationGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

impl NotificationGate {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_shown: Mutex::new(HashMap::new()),
        }
    }

    /// Decide how to surface `error`. Critical errors always end the
    /// session, even when the request opted out of notifications.
    pub fn decide(&self, error: &ClassifiedError, skip_notification: bool) -> NotificationAction {
        if error.is_cancelled() {
            return NotificationAction::Suppressed(SuppressReason::Cancelled);
        }
        if is_critical(error) {
            return NotificationAction::SessionExpired;
        }
        if skip_notification {
            return NotificationAction::Suppressed(SuppressReason::OptedOut);
        }

        let key = error.code.to_string();
        let now = Instant::now();
        let mut last_shown = self
            .last_shown
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(shown_at) = last_shown.get(&key) {
            if now.duration_since(*shown_at) < self.window {
                return NotificationAction::Suppressed(SuppressReason::Duplicate);
            }
        }
        last_shown.insert(key.clone(), now);
        NotificationAction::Show { key }
    }

    /// Decide and forward to `notifier`
    pub fn report(
        &self,
        error: &ClassifiedError,
        skip_notification: bool,
        notifier: &dyn Notifier,
    ) -> NotificationAction {
        let action = self.decide(error, skip_notification);
        match &action {
            NotificationAction::SessionExpired => notifier.session_expired(error),
            NotificationAction::Show { key } => notifier.show(key, error),
            NotificationAction::Suppressed(_) => {}
        }
        action
    }
}
