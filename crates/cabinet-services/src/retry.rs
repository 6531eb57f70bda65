//! Bounded retry around provider calls.

use std::future::Future;
use std::time::Duration;

use cabinet_core::Config;

use crate::error::ObjectStorageResult;

/// Attempt count and base delay; the n-th retry waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.object_storage_retry_attempts(),
            Duration::from_millis(config.object_storage_retry_delay_ms()),
        )
    }

    /// No waiting between attempts.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. The last error is returned.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> ObjectStorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ObjectStorageResult<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < attempts => {
                let delay = policy.base_delay * attempt;
                tracing::warn!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Object storage call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if error.is_retryable() {
                    tracing::error!(operation = operation, attempts = attempt, error = %error, "Object storage call failed after retries");
                }
                return Err(error);
            }
        }
    }
}
