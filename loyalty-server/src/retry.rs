//! Linear backoff retry
//!
//! Retry `n` (1-based) waits `backoff_base * n`, so the canonical policy
//! (5 retries, 2 s base) sleeps 2, 4, 6, 8 and 10 seconds before giving up on
//! the sixth failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::SyncTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Delay before retry `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl From<&SyncTuning> for RetryPolicy {
    fn from(tuning: &SyncTuning) -> Self {
        Self::new(tuning.max_retries, tuning.backoff_base)
    }
}

/// Why [`retry_with_backoff`] gave up
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts made, including the first
    pub attempts: u32,
    /// `false` when the last error was not retryable
    pub retryable: bool,
    pub error: E,
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the retry budget is spent.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    label: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, RetryFailure<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if !is_retryable(&error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    retryable: false,
                    error,
                });
            }
            Err(error) if attempt > policy.max_retries => {
                tracing::error!(
                    attempts = attempt,
                    max_retries = policy.max_retries,
                    "{label} failed, retries exhausted: {error}"
                );
                return Err(RetryFailure {
                    attempts: attempt,
                    retryable: true,
                    error,
                });
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "{label} failed, retrying: {error}"
                );
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
