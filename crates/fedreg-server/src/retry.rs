use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::source::FetchError;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Bounded retry with exponential backoff for upstream requests.
///
/// Only transient failures are retried (network errors, 429 and 5xx). With
/// `max_retries == 0` an operation runs exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms: MAX_BACKOFF_MS.max(initial_backoff_ms),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        tracing::debug!(retries = attempt, "Upstream request succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !self.should_retry(&err, attempt) {
                        return Err(err);
                    }
                    let backoff = self.calculate_backoff(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient upstream failure, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// min(initial_backoff * 2^attempt, max_backoff)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}
