//! Display-lifecycle tracking for on-screen notifications.
//!
//! Each visible notification is either permanent (stays until the user
//! dismisses it) or timed (auto-dismisses after its display time). The
//! manager schedules one-shot expiry timers, cancels them on explicit
//! dismissal, and reports when the visible set becomes empty.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use notify_client::{DisplayTimeDefaults, Notification};

const EXPIRY_CHANNEL_CAPACITY: usize = 64;

/// Outcome of removing a notification from the visible set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The notification was visible and has been removed.
    /// `all_clear` is true when this removal emptied the visible set.
    Removed { all_clear: bool },
    /// The id was not being tracked; removing it is a no-op.
    NotTracked,
}

/// Tracks visible notifications and their dismiss timers.
///
/// Expired ids arrive on the receiver returned by [`new`](Self::new);
/// the owning loop feeds them back through [`expire`](Self::expire).
pub struct LifecycleManager {
    visible: HashMap<String, Option<AbortHandle>>,
    expiry_tx: mpsc::Sender<String>,
    defaults: DisplayTimeDefaults,
}

impl LifecycleManager {
    pub fn new(defaults: DisplayTimeDefaults) -> (Self, mpsc::Receiver<String>) {
        let (expiry_tx, expiry_rx) = mpsc::channel(EXPIRY_CHANNEL_CAPACITY);
        (
            Self {
                visible: HashMap::new(),
                expiry_tx,
                defaults,
            },
            expiry_rx,
        )
    }

    /// Begin tracking a displayed notification, scheduling its expiry
    /// timer unless it is permanent.
    pub fn track(&mut self, notification: &Notification) {
        let handle = if notification.is_permanent {
            None
        } else {
            let delay = notification.effective_display_time(&self.defaults);
            let id = notification.id.clone();
            let tx = self.expiry_tx.clone();
            tracing::debug!(id = %id, delay_ms = delay.as_millis() as u64, "Scheduling auto-dismiss");
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(id).await;
            });
            Some(task.abort_handle())
        };

        // Re-display of an id replaces its timer.
        if let Some(Some(old)) = self.visible.insert(notification.id.clone(), handle) {
            old.abort();
        }
    }

    /// Explicit dismiss: cancel the pending timer and remove.
    /// Idempotent; dismissing an unknown id is a no-op.
    pub fn dismiss(&mut self, id: &str) -> Removal {
        match self.visible.remove(id) {
            Some(handle) => {
                if let Some(handle) = handle {
                    handle.abort();
                }
                tracing::debug!(id = %id, remaining = self.visible.len(), "Notification dismissed");
                Removal::Removed {
                    all_clear: self.visible.is_empty(),
                }
            }
            None => Removal::NotTracked,
        }
    }

    /// Timer-driven removal. A stale expiry for a since-dismissed id
    /// resolves to `NotTracked`.
    pub fn expire(&mut self, id: &str) -> Removal {
        self.dismiss(id)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify_client::NotificationKind;

    use super::*;

    fn timed(id: &str, kind: NotificationKind, display_time: Option<u64>) -> Notification {
        Notification {
            id: id.into(),
            kind,
            is_permanent: false,
            display_time,
        }
    }

    fn permanent(id: &str) -> Notification {
        Notification {
            id: id.into(),
            kind: NotificationKind::Info {
                message: "hello".into(),
            },
            is_permanent: true,
            display_time: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_notification_expires_at_the_kind_default() {
        let (mut manager, mut expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&timed(
            "n2",
            NotificationKind::Coins {
                message: String::new(),
                amount: Some(1000),
            },
            None,
        ));

        tokio::time::sleep(Duration::from_millis(14_999)).await;
        assert!(expiry_rx.try_recv().is_err(), "expired too early");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(expiry_rx.recv().await.as_deref(), Some("n2"));
        assert_eq!(manager.expire("n2"), Removal::Removed { all_clear: true });
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_display_time_overrides_the_default() {
        let (mut manager, mut expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&timed(
            "n1",
            NotificationKind::Error {
                message: "boom".into(),
            },
            Some(1_000),
        ));
        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert_eq!(expiry_rx.recv().await.as_deref(), Some("n1"));
        let _ = manager;
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_notification_never_expires() {
        let (mut manager, mut expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&permanent("n1"));
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(expiry_rx.try_recv().is_err());
        assert_eq!(manager.visible_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_the_pending_timer() {
        let (mut manager, mut expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&timed(
            "n1",
            NotificationKind::Info {
                message: "hi".into(),
            },
            Some(5_000),
        ));
        assert_eq!(manager.dismiss("n1"), Removal::Removed { all_clear: true });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(
            expiry_rx.try_recv().is_err(),
            "cancelled timer must not fire"
        );
    }

    #[tokio::test]
    async fn dismiss_is_idempotent() {
        let (mut manager, _expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&permanent("n1"));
        assert_eq!(manager.dismiss("n1"), Removal::Removed { all_clear: true });
        assert_eq!(manager.dismiss("n1"), Removal::NotTracked);
        assert_eq!(manager.visible_count(), 0);
    }

    #[tokio::test]
    async fn all_clear_fires_only_on_the_last_removal() {
        let (mut manager, _expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&permanent("n1"));
        manager.track(&permanent("n2"));

        assert_eq!(manager.dismiss("n1"), Removal::Removed { all_clear: false });
        assert_eq!(manager.dismiss("n2"), Removal::Removed { all_clear: true });
        assert_eq!(manager.dismiss("n2"), Removal::NotTracked);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_after_dismiss_is_a_no_op() {
        let (mut manager, _expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        manager.track(&timed(
            "n1",
            NotificationKind::Info {
                message: "hi".into(),
            },
            Some(1_000),
        ));
        assert_eq!(manager.dismiss("n1"), Removal::Removed { all_clear: true });
        assert_eq!(manager.expire("n1"), Removal::NotTracked);
    }

    #[tokio::test(start_paused = true)]
    async fn re_display_replaces_the_previous_timer() {
        let (mut manager, mut expiry_rx) = LifecycleManager::new(DisplayTimeDefaults::default());
        let n = timed(
            "n1",
            NotificationKind::Info {
                message: "hi".into(),
            },
            Some(2_000),
        );
        manager.track(&n);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        manager.track(&n);

        // The first timer would have fired at 2s; it was replaced.
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(expiry_rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert_eq!(expiry_rx.recv().await.as_deref(), Some("n1"));
    }
}
