//! Scheduler adapters.
//!
//! - `TokioScheduler` - Sleeps on the tokio timer
//! - `RecordingScheduler` - Records requested delays and returns at once

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::Scheduler;

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test scheduler: no real waiting, every delay is recorded.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps().len()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        // Let other tasks (e.g. a canceller) run between checks
        tokio::task::yield_now().await;
    }
}
