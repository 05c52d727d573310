//! Notification registry: duplicate-delivery suppression.
//!
//! Under the polling strategy the server keeps returning the same
//! pending notification until it clears it, so consecutive polls can
//! re-deliver one logical push. The registry remembers the last accepted
//! id and rejects a repeat of it. Push delivery is one message per
//! event and bypasses this check.

use notify_client::Notification;

/// Tracks the identity of the most recently accepted notification.
///
/// Single writer (the intake loop); resets on process restart, so the
/// first notification after a restart is always accepted.
#[derive(Debug, Default)]
pub struct Registry {
    last_notification_id: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept or reject a delivered payload.
    ///
    /// Returns `false` when the id matches the last accepted one
    /// (already shown); otherwise records the id and returns `true`.
    pub fn accept(&mut self, notification: &Notification) -> bool {
        if self.last_notification_id.as_deref() == Some(notification.id.as_str()) {
            tracing::debug!(id = %notification.id, "Duplicate delivery suppressed");
            return false;
        }
        self.last_notification_id = Some(notification.id.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_client::NotificationKind;

    fn info(id: &str) -> Notification {
        Notification {
            id: id.into(),
            kind: NotificationKind::Info {
                message: "hello".into(),
            },
            is_permanent: true,
            display_time: None,
        }
    }

    #[test]
    fn same_id_twice_is_rejected_on_the_second_call() {
        let mut registry = Registry::new();
        assert!(registry.accept(&info("n1")));
        assert!(!registry.accept(&info("n1")));
    }

    #[test]
    fn distinct_ids_are_both_accepted() {
        let mut registry = Registry::new();
        assert!(registry.accept(&info("n1")));
        assert!(registry.accept(&info("n2")));
    }

    #[test]
    fn an_id_can_reappear_after_a_different_one() {
        // Only the immediately preceding delivery is suppressed; a
        // later reuse of an old id is a new notification instance.
        let mut registry = Registry::new();
        assert!(registry.accept(&info("n1")));
        assert!(registry.accept(&info("n2")));
        assert!(registry.accept(&info("n1")));
    }

    #[test]
    fn fresh_registry_accepts_anything() {
        let mut registry = Registry::new();
        assert!(registry.accept(&info("seen-before-restart")));
    }
}
