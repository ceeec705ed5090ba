//! Toast notification configuration

use serde::Deserialize;
use std::time::Duration;

/// Toast display defaults
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// How long a toast stays up unless it sets its own duration; 0 keeps it
    /// until dismissed
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
}

impl NotificationConfig {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
        }
    }
}

fn default_duration_ms() -> u64 {
    5000
}
