//! Notification channel.
//!
//! Fire-and-forget error delivery, used only on the short-circuit path when a
//! goal cannot even be submitted. Notifications carry an optional action so
//! the user gets a remediation hint, not just an error string.

use tracing::error;

/// A user-facing action attached to a notification, e.g. "Open settings".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    /// Link label shown to the user.
    pub label: String,
    /// Host-interpreted target, e.g. a settings pane identifier.
    pub target: String,
}

/// An error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub action: Option<NotificationAction>,
}

impl Notification {
    /// Create a notification without an action.
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            action: None,
        }
    }

    /// Builder method to attach an action.
    pub fn with_action(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.action = Some(NotificationAction {
            label: label.into(),
            target: target.into(),
        });
        self
    }
}

/// Fire-and-forget notification delivery.
pub trait Notifier: Send + Sync {
    /// Deliver an error notification. Must not block or fail loudly.
    fn notify_error(&self, notification: Notification);
}

/// Default sink that emits notifications through the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, notification: Notification) {
        match &notification.action {
            Some(action) => error!(
                title = %notification.title,
                action = %action.label,
                target = %action.target,
                "{}",
                notification.message
            ),
            None => error!(title = %notification.title, "{}", notification.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_action() {
        let notification =
            Notification::new("Failed", "No toolchain").with_action("Open settings", "toolchain");
        let action = notification.action.unwrap();
        assert_eq!(action.label, "Open settings");
        assert_eq!(action.target, "toolchain");
    }
}
