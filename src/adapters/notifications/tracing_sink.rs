//! Notification sink that writes toasts to the tracing log.
//!
//! Used by the binary, which has no UI to show toasts in.

use crate::domain::notification::{Notification, NotificationKind};
use crate::ports::NotificationSink;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotificationSink {
    fn publish(&self, notification: Notification) {
        let detail = notification.message.as_deref().unwrap_or_default();
        match notification.kind {
            NotificationKind::Error => {
                tracing::error!(id = %notification.id, title = %notification.title, detail, "toast")
            }
            NotificationKind::Warning => {
                tracing::warn!(id = %notification.id, title = %notification.title, detail, "toast")
            }
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(id = %notification.id, title = %notification.title, detail, "toast")
            }
        }
    }
}
