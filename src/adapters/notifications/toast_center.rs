//! In-memory toast center.
//!
//! Keeps the list of visible toasts and fans every published notification
//! out to subscribers over a broadcast channel.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::domain::foundation::{NotificationId, Timestamp};
use crate::domain::notification::{Notification, DEFAULT_DURATION};
use crate::ports::NotificationSink;

const CHANNEL_CAPACITY: usize = 64;

/// Publish/subscribe surface for toasts.
///
/// # Example
///
/// ```ignore
/// let toasts = Arc::new(ToastCenter::new());
/// let mut rx = toasts.subscribe();
///
/// toasts.publish(Notification::success("Added to cart"));
///
/// let toast = rx.recv().await?;
/// toasts.dismiss(&toast.id);
/// ```
pub struct ToastCenter {
    active: Mutex<Vec<Notification>>,
    sender: broadcast::Sender<Notification>,
    default_duration: Duration,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_DURATION)
    }

    /// Toasts published with the stock duration get `duration` instead.
    pub fn with_default_duration(duration: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            active: Mutex::new(Vec::new()),
            sender,
            default_duration: duration,
        }
    }

    fn active_guard(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every notification published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Currently visible toasts, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.active_guard().clone()
    }

    /// Hide one toast. Returns false if it was already gone.
    pub fn dismiss(&self, id: &NotificationId) -> bool {
        let mut active = self.active_guard();
        let before = active.len();
        active.retain(|toast| &toast.id != id);
        active.len() != before
    }

    pub fn clear(&self) {
        self.active_guard().clear();
    }

    /// Drop every toast whose duration has elapsed at `now`; sticky toasts stay.
    pub fn dismiss_expired(&self, now: Timestamp) -> Vec<Notification> {
        let mut active = self.active_guard();
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *active)
            .into_iter()
            .partition(|toast| toast.is_expired_at(now));
        *active = kept;
        expired
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for ToastCenter {
    fn publish(&self, mut notification: Notification) {
        if notification.duration == DEFAULT_DURATION {
            notification.duration = self.default_duration;
        }
        self.active_guard().push(notification.clone());
        // No subscribers is fine; the toast is still listed as active
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_lists_toast_as_active() {
        let center = ToastCenter::new();

        center.publish(Notification::success("Tee added to cart"));

        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Tee added to cart");
    }

    #[tokio::test]
    async fn subscribers_receive_published_toasts() {
        let center = ToastCenter::new();
        let mut rx = center.subscribe();

        center.publish(Notification::error("Failed to sync cart"));

        let toast = rx.recv().await.unwrap();
        assert_eq!(toast.title, "Failed to sync cart");
    }

    #[test]
    fn dismiss_removes_only_that_toast() {
        let center = ToastCenter::new();
        let first = Notification::info("one");
        let first_id = first.id;
        center.publish(first);
        center.publish(Notification::info("two"));

        assert!(center.dismiss(&first_id));
        assert!(!center.dismiss(&first_id));
        assert_eq!(center.active().len(), 1);
        assert_eq!(center.active()[0].title, "two");
    }

    #[test]
    fn dismiss_expired_keeps_sticky_and_fresh() {
        let center = ToastCenter::new();
        let short = Notification::info("short").with_duration(Duration::from_millis(10));
        let now = short.created_at.plus_millis(1_000);
        center.publish(short);
        center.publish(Notification::error("sticky").sticky());
        center.publish(Notification::info("long").with_duration(Duration::from_secs(3600)));

        let expired = center.dismiss_expired(now);

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].title, "short");
        assert_eq!(center.active().len(), 2);
    }

    #[test]
    fn configured_default_duration_applies() {
        let center = ToastCenter::with_default_duration(Duration::from_millis(1500));
        center.publish(Notification::success("Saved"));
        assert_eq!(center.active()[0].duration, Duration::from_millis(1500));
    }

    #[test]
    fn clear_empties_active() {
        let center = ToastCenter::new();
        center.publish(Notification::info("a"));
        center.clear();
        assert!(center.active().is_empty());
    }
}
