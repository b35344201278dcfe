//! Bounded exponential backoff for transient source failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;
use crate::Result;

/// Run `op` until it succeeds or the attempt budget is exhausted.
///
/// The delay before each retry doubles from `initial_delay_ms`, capped
/// at `max_delay_ms`; an initial delay above the cap is clamped to it.
/// The last error is returned once `max_attempts` is reached.
///
/// # Errors
///
/// Propagates the final error from `op` after the last attempt.
pub async fn with_backoff<T, F, Fut>(policy: &RetryConfig, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let mut delay = Duration::from_millis(policy.initial_delay_ms).min(max_delay);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts => {
                warn!(attempt, ?delay, %err, "attempt failed, backing off");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(max_delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
