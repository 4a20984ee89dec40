//! Process-wide rate limiting for registry queries.
//!
//! One [`RateLimiter`] is shared by every worker in a batch. The
//! read-check-sleep-update sequence runs under a single async mutex, so two
//! workers can never both observe the same stale timestamp and fire inside
//! the interval.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum gap between successive grants, across all callers.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Instant of the most recent grant
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until at least `min_interval` has passed since the last grant.
    ///
    /// The lock is held while sleeping: the next caller queues behind it and
    /// then measures from this grant. Tokio's mutex wakes waiters in FIFO order.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
