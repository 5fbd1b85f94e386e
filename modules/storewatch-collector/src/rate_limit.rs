use std::future::Future;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{CollectError, Result};

pub const DEFAULT_MAX_CONCURRENT: usize = 8;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Counting semaphore with a settle delay: a permit is held for the request
/// plus `settle` afterwards, so at most `capacity` requests start per
/// `settle` window.
pub struct RateLimiter {
    semaphore: Semaphore,
    capacity: usize,
    settle: Duration,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, settle: Duration) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            settle,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run `op` while holding a permit.
    pub async fn run<F: Future>(&self, op: F) -> Result<F::Output> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CollectError::LimiterClosed)?;
        let output = op.await;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(output)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT, DEFAULT_SETTLE_DELAY)
    }
}
