//! Fixed-delay retry for remote calls.
//!
//! Every network-facing operation (chat completions, SQL procedure calls)
//! goes through [`with_retry`] or [`with_retry_if`]. Wrapped operations are
//! re-executed from scratch, so they must tolerate running more than once.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Bounded retry policy with a constant delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Run `operation` under `policy`, retrying every failure.
///
/// Returns the first success, or the error from the final attempt.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, label: &str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    with_retry_if(policy, label, |_| true, operation).await
}

/// Run `operation` under `policy`, retrying only errors accepted by `is_retryable`.
///
/// A rejected error is returned immediately without further attempts.
pub async fn with_retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "Retry succeeded");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_secs = policy.delay.as_secs_f64(),
                    error = %e,
                    "Operation failed, will retry"
                );
                sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(label, attempt, max_attempts, error = %e, "Operation failed, giving up");
                return Err(e);
            }
        }
    }
}
