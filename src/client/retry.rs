//! Retry and backoff policy for transient upstream failures
//!
//! Transient failures (connect/timeout errors, 5xx, 429) are retried with
//! exponential backoff: base delay doubling per attempt, capped, plus up to
//! 25% random jitter. A `Retry-After` hint on 429 replaces the computed delay.

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Upper bound honored for server-supplied `Retry-After` hints
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling for the exponential delay (before jitter)
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Backoff plus random jitter of up to a quarter of the delay.
    pub fn backoff_with_jitter(&self, retry: u32) -> Duration {
        let delay = self.backoff(retry);
        let jitter_ceiling = delay.as_millis() as u64 / 4;
        if jitter_ceiling == 0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
        delay + Duration::from_millis(jitter)
    }
}

/// Whether a response status is worth retrying.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Parse a delay-seconds `Retry-After` header, clamped to a sane ceiling.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
