//! Progressive-backoff retry for single logical requests.
//!
//! An attempt that fails with a retryable error (transport failure or
//! timeout) is retried after `base_delay * attempt`, so the default
//! policy waits 1 s, then 2 s, between its three attempts. Non-retryable
//! errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Default number of attempts per logical request.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff unit.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 act as 1.
    pub attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails non-retryably, or the attempt
    /// budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request attempt failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(
                            operation,
                            attempts,
                            error = %e,
                            "Request failed after all retries",
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}
