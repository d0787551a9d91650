//! Linear back-off retry for rate-limited sources.
//!
//! [`retry_on_rate_limit`] retries only on [`SourceError::RateLimited`].
//! Every other error is returned after a single attempt, since retrying an
//! auth failure or a 5xx from a quota-metered API burns quota without helping.

use std::future::Future;
use std::time::Duration;

use trendsage_core::SourceKind;

use crate::error::SourceError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Attempt budget and back-off step for one (competitor, source) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// After a rate-limited attempt `n`, wait `n × backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Delay to wait after rate-limited attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Runs `operation` until it succeeds, fails with a non-rate-limit error, or
/// the attempt budget is spent.
///
/// Schedule with the default policy (3 attempts, 5 s step):
///
/// | Attempt | Outcome      | Wait before next |
/// |---------|--------------|------------------|
/// | 1       | rate limited | 5 s              |
/// | 2       | rate limited | 10 s             |
/// | 3       | rate limited | - (returned)     |
///
/// There is no wait after the final attempt. When the budget runs out, the
/// last `RateLimited` error is returned.
///
/// # Errors
///
/// Returns the first non-rate-limit error, or the final rate-limit error.
pub async fn retry_on_rate_limit<T, F, Fut>(
    policy: &RetryPolicy,
    kind: SourceKind,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_rate_limited() || attempt >= max_attempts {
                    return Err(err);
                }

                let delay = policy.delay_after(attempt);
                let retry_after_secs = match &err {
                    SourceError::RateLimited {
                        retry_after_secs, ..
                    } => *retry_after_secs,
                    _ => None,
                };
                tracing::warn!(
                    source = %kind,
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    retry_after_secs,
                    "rate limited, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
