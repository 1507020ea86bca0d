use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use crate::{AppError, Result};

/// Backoff schedule for connecting to backing services at startup.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Delay before attempt `attempt + 1`, doubling up to `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Only connection-type failures are worth retrying.
fn is_transient(err: &AppError) -> bool {
    matches!(err, AppError::DatabaseError(_) | AppError::CacheError(_))
}

pub async fn retry<F, Fut, T>(what: &str, policy: RetryPolicy, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(service = what, attempt, "connected after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    service = what,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "connection failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(service = what, attempt, error = %e, "giving up");
                return Err(e);
            }
        }
    }
}
