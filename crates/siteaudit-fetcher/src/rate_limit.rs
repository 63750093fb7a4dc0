//! Per-host request spacing.
//!
//! A [`RateLimiter`] is owned by the [`crate::SiteFetcher`] it is handed to,
//! so separate fetchers (and separate test cases) never share counters.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between requests to the same host.
///
/// Reservations are handed out in call order: each caller takes the next free
/// slot for its host and sleeps until that slot arrives. The lock is released
/// before sleeping.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// A limiter that never waits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a request to `host` is allowed.
    pub async fn acquire(&self, host: &str) {
        if self.min_interval.is_zero() {
            return;
        }

        let key = host.to_ascii_lowercase();
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(&key).copied().map_or(now, |s| s.max(now));
            slots.insert(key, slot + self.min_interval);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tracing::debug!(host, wait_ms = wait.as_millis(), "rate limiter delaying request");
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let started = Instant::now();
        for _ in 0..50 {
            limiter.acquire("example.com").await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn same_host_requests_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        let started = Instant::now();
        limiter.acquire("example.com").await;
        limiter.acquire("example.com").await;
        limiter.acquire("example.com").await;
        // First is immediate, the next two wait one interval each.
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn different_hosts_do_not_wait_on_each_other() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let started = Instant::now();
        limiter.acquire("a.example.com").await;
        limiter.acquire("b.example.com").await;
        limiter.acquire("c.example.com").await;
        assert!(started.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn separate_instances_do_not_share_state() {
        let first = RateLimiter::new(Duration::from_millis(500));
        let second = RateLimiter::new(Duration::from_millis(500));
        let started = Instant::now();
        first.acquire("example.com").await;
        second.acquire("example.com").await;
        assert!(started.elapsed() < Duration::from_millis(250));
    }
}
