//! Whole-run retry.

use std::time::Duration;

/// How often and how patiently a failed run is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay unit; attempt `n` is followed by `n * base_delay`.
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
    /// Override the attempt count. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Pause after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Every attempt failed.
#[derive(Debug, thiserror::Error)]
#[error("Giving up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
}

/// Run `op` until it succeeds or `policy` runs out of attempts.
///
/// `op` receives the 1-based attempt number. Every failure is passed to
/// `on_error` before `sleep` is asked to wait; there is no wait after the
/// final attempt.
pub fn run_with_retry<T, E, S, H, F>(
    policy: &RetryPolicy,
    mut sleep: S,
    mut on_error: H,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    S: FnMut(Duration),
    H: FnMut(u32, &E),
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                on_error(attempt, &e);
                if attempt >= attempts {
                    return Err(RetryExhausted {
                        attempts,
                        last_error: e,
                    });
                }
                sleep(policy.delay_after(attempt));
                attempt += 1;
            }
        }
    }
}
