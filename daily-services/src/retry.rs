//! Bounded retry with linearly increasing backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How the wait grows between attempts
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Wait `base * attempt` after the given failed attempt
    Linear(Duration),
    Constant(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear(Duration::from_secs(3)),
        }
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear(base_delay),
        }
    }

    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear(base) => base.saturating_mul(attempt),
            Backoff::Constant(delay) => delay,
        }
    }
}

/// Run `operation` until it succeeds, `policy.max_attempts` is reached, or
/// it fails with an error for which `should_retry` is false.
///
/// The last error is returned unchanged.
pub async fn retry_when<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if attempt > 1 {
            tracing::info!("{}: attempt {}/{}", label, attempt, attempts);
        }

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{}: succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt < attempts && should_retry(&e) => {
                let wait = policy.delay_for(attempt);
                let message: String = e.to_string().chars().take(100).collect();
                tracing::warn!("{}: attempt {} failed: {}", label, attempt, message);
                tracing::warn!("{}: waiting {:?} before retry", label, wait);
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) if attempt < attempts => {
                tracing::error!("{}: giving up on non-retryable error: {}", label, e);
                return Err(e);
            }
            Err(e) => {
                tracing::error!("{}: all {} attempts failed: {}", label, attempts, e);
                return Err(e);
            }
        }
    }
}
