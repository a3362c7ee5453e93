//! Bounded retry with exponential backoff for remote calls.
//!
//! Every retried operation must be safe to repeat in full: callers pass a
//! closure that builds a fresh request (or writes to a fresh path) on each
//! invocation. No state carries over between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

/// Retry policy for unreliable remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first try).
    pub max_attempts: u32,

    /// Delay before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy with no inter-attempt delay (tests).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to sleep after the given failed attempt (1-indexed):
    /// base, 2x base, 4x base, ...
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Invoke `op` until it succeeds or the policy is exhausted.
///
/// Each attempt is a full, independent execution of `op`. Failed attempts
/// are logged at warn level with the upcoming delay; exhaustion is logged
/// at error level and the last error is returned for the caller to
/// classify as fatal or recoverable.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < policy.max_attempts {
                    let delay = policy.delay_after_attempt(attempt);
                    warn!(
                        label,
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    error!(
                        label,
                        attempts = attempt,
                        error = %e,
                        "all attempts exhausted"
                    );
                    return Err(e);
                }
            }
        }
    }
}
