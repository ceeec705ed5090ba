//! Scheduler port - the only way the payment poll loop waits.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends the caller for a duration.
///
/// Production code sleeps on the tokio timer; tests inject a scheduler that
/// records the requested delays and returns immediately.
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
