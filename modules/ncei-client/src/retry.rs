use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{NceiError, Result};

/// Fixed-budget retry: every failure is retried the same way, after the same
/// pause, until `max_attempts` is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
/// At least one attempt is always made.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, url: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(NceiError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                        last_error: Box::new(e),
                    });
                }
                warn!(url, attempt, error = %e, "Request failed, retrying");
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
