//! Notification sink port - where user-facing toasts are published.

use crate::domain::notification::Notification;

/// Receives notifications raised by the sync and checkout flows.
///
/// Publishing never fails from the caller's point of view; a sink with no
/// listeners drops the notification.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: Notification);
}
