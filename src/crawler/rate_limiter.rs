//! Minimum spacing between requests that share a key
//!
//! The scheduler keys requests by host or by worker. Each key owns the time
//! of its next free slot; a caller reserves the slot under a short lock and
//! sleeps outside it, so waiting on one key never blocks another.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until at least `delay` has passed since the previous slot for `key`
    ///
    /// The first call for a key returns immediately.
    pub async fn wait(&self, key: &str) {
        if self.delay.is_zero() {
            return;
        }

        let slot = self.reserve(key);
        tokio::time::sleep_until(slot).await;
    }

    /// Reserves the next slot for `key` and returns when it starts
    fn reserve(&self, key: &str) -> Instant {
        let now = Instant::now();
        let mut slots = self
            .next_slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let slot = match slots.get(key) {
            Some(&next) if next > now => next,
            _ => now,
        };
        slots.insert(key.to_string(), slot + self.delay);
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.wait("example.com").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_is_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.wait("example.com").await;
        limiter.wait("example.com").await;
        limiter.wait("example.com").await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_keys_do_not_serialize() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();

        limiter.wait("a.example.com").await;
        limiter.wait("b.example.com").await;
        limiter.wait("worker-3").await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_get_distinct_slots() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait("example.com").await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap() - start);
        }
        times.sort();

        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.wait("example.com").await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_key_does_not_accumulate_debt() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.wait("example.com").await;

        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.wait("example.com").await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
