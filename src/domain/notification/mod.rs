//! Toast-style notifications.
//!
//! Produced by the sync coordinator and the checkout flow, consumed through
//! the `NotificationSink` port.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{NotificationId, Timestamp};

/// Default display duration for a toast.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A user-facing message.
///
/// A zero `duration` keeps the toast until it is dismissed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub duration: Duration,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            title: title.into(),
            message: None,
            duration: DEFAULT_DURATION,
            created_at: Timestamp::now(),
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Keeps the toast until dismissed.
    pub fn sticky(self) -> Self {
        self.with_duration(Duration::ZERO)
    }

    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }

    /// True once the display duration has elapsed at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        if self.is_sticky() {
            return false;
        }
        let expires_at = self
            .created_at
            .plus_millis(u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX));
        !now.is_before(&expires_at)
    }
}
