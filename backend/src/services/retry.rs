//! Bounded retry for storage conflicts
//!
//! Serialization failures and deadlocks are transient; the workflow layer
//! retries them with backoff before reporting a transient failure. Business
//! outcomes are final and pass straight through.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{AppError, AppResult};

/// Upper bound on a single backoff sleep
const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Run `op`, retrying on retryable storage conflicts with exponential
/// backoff. After the attempt budget is spent the failure surfaces as
/// `Conflict` so callers see a transient error, not an internal one.
pub async fn with_conflict_retry<T, F, Fut>(config: RetryConfig, op: F) -> AppResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match op().await {
            Err(err) if err.is_retryable() => {
                if attempt == max_attempts {
                    tracing::warn!("storage conflict persisted after {max_attempts} attempts");
                    return Err(AppError::Conflict(
                        "The operation hit repeated storage contention; please retry".to_string(),
                    ));
                }
                let delay = backoff_delay(config.base_delay_ms, attempt);
                tracing::debug!(attempt, delay_ms = delay, "retrying after storage conflict");
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            other => return other,
        }
    }

    unreachable!("retry loop always returns")
}

/// Delay before the retry following `attempt`. Doubles per attempt and
/// caps at `MAX_RETRY_DELAY_MS`; large attempt budgets must not overflow
/// the shift or the multiply.
fn backoff_delay(base_delay_ms: u64, attempt: u32) -> u64 {
    1u64.checked_shl(attempt.saturating_sub(1))
        .and_then(|factor| base_delay_ms.checked_mul(factor))
        .unwrap_or(u64::MAX)
        .min(MAX_RETRY_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(50, 1), 50);
        assert_eq!(backoff_delay(50, 2), 100);
        assert_eq!(backoff_delay(50, 3), 200);
    }

    #[test]
    fn test_backoff_never_overflows() {
        assert_eq!(backoff_delay(50, 64), MAX_RETRY_DELAY_MS);
        assert_eq!(backoff_delay(50, 1_000), MAX_RETRY_DELAY_MS);
        assert_eq!(backoff_delay(u64::MAX, 2), MAX_RETRY_DELAY_MS);
        assert_eq!(backoff_delay(0, 3), 0);
    }

    #[tokio::test]
    async fn test_business_errors_pass_through_without_retry() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 0,
        };
        let calls = AtomicU32::new(0);

        let result = with_conflict_retry(config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(AppError::ValidationError("bad input".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_conflicts_surface_as_conflict() {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 0,
        };
        let calls = AtomicU32::new(0);

        let result = with_conflict_retry(config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(AppError::Conflict("contention".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
