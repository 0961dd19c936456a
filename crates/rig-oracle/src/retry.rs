//! Exponential backoff with full jitter for transient oracle failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::OracleError;

/// Maximum backoff cap (ms)
pub(crate) const BACKOFF_MAX_MS: u64 = 5_000;

/// Run `op` up to `max_attempts` times, retrying only retryable errors.
pub(crate) async fn with_retry<F, Fut, T>(
    label: &str,
    max_attempts: u32,
    backoff_base_ms: u64,
    op: F,
) -> Result<T, OracleError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, OracleError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                let wait = backoff_with_jitter(backoff_base_ms, attempt);
                tracing::debug!(
                    call = label,
                    attempt,
                    max_attempts,
                    wait_ms = wait,
                    error = %e,
                    "oracle call failed, retrying"
                );
                sleep(Duration::from_millis(wait)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// random(0, min(cap, base * 2^(attempt-1)))
fn backoff_with_jitter(base_ms: u64, attempt: u32) -> u64 {
    let exp = base_ms.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(BACKOFF_MAX_MS);
    rand::thread_rng().gen_range(0..=capped)
}
