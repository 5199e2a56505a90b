//! Bounded retries with exponential backoff around any [`Fetcher`]

use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::rate_limiter::RateLimiter;
use std::time::Duration;
use url::Url;

/// How transient fetch failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Final result of a fetch plus how many attempts it took
#[derive(Debug)]
pub struct RetryOutcome {
    pub result: FetchResult,
    pub attempts: u32,
}

impl RetryOutcome {
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Fetches `url`, retrying retriable failures per `policy`
///
/// Every attempt first waits on the rate limiter under `rate_key`, so
/// retries are spaced like any other request to the same host. Terminal
/// failures and the last failure after retries run out are returned as-is.
/// Dropping the returned future abandons the fetch at its current attempt.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    limiter: &RateLimiter,
    rate_key: &str,
    url: &Url,
    timeout: Duration,
    policy: &RetryPolicy,
) -> RetryOutcome {
    let mut attempts = 0;

    loop {
        limiter.wait(rate_key).await;
        attempts += 1;

        let result = fetcher.fetch(url, timeout).await;
        let failure = match &result {
            FetchResult::Failure(failure) => failure,
            FetchResult::Success(_) => return RetryOutcome { result, attempts },
        };

        let retries_done = attempts - 1;
        if !failure.retriable || retries_done >= policy.max_retries {
            return RetryOutcome { result, attempts };
        }

        let delay = policy.backoff(retries_done);
        tracing::debug!(
            "Retrying {} after {} (attempt {}/{}, waiting {:?})",
            url,
            failure.kind,
            attempts + 1,
            policy.max_retries + 1,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}
