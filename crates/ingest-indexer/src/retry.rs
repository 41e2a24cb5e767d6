//! Exponential backoff retry loop, grounded on the teacher's agent-runtime
//! task executor (`calculate_retry_delay` and its retry-until-exhausted
//! loop), adapted to this crate's Retryable/Terminal error split instead of
//! a blanket `is_retryable()` on the task.

use std::time::Duration;

use crate::error::IndexerError;

/// Base delay before the first retry (§4.I: 100ms).
pub const BASE_DELAY: Duration = Duration::from_millis(100);
/// Maximum number of retries after the initial attempt (§4.I: 3, ≈700ms total).
pub const MAX_RETRIES: u32 = 3;

/// `base * 2^(attempt - 1)`, attempt counted from 1.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_DELAY * 2u32.pow(attempt.saturating_sub(1))
}

/// Run `submit` until it succeeds, returns a [`IndexerError::Terminal`], or
/// exhausts [`MAX_RETRIES`] retryable attempts (in which case the last
/// retryable error is returned as-is — still tagged `Retryable`, since the
/// caller cares about exhaustion via the attempt count, not a relabeled
/// terminal variant).
pub async fn retry_with_backoff<T, F, Fut>(mut submit: F) -> Result<T, IndexerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, IndexerError>>,
{
    let mut attempt = 0;
    loop {
        match submit().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < MAX_RETRIES => {
                attempt += 1;
                let delay = backoff_delay(attempt);
                tracing::warn!(attempt, ?delay, error = %err, "bulk index attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles_each_attempt() {
        assert_eq!(backoff_delay(1), Duration::from_millis(100));
        assert_eq!(backoff_delay(2), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result = retry_with_backoff(|| async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(IndexerError::Retryable("transient".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), IndexerError> = retry_with_backoff(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(IndexerError::Terminal("bad request".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), IndexerError> = retry_with_backoff(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(IndexerError::Retryable("still down".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1 + MAX_RETRIES);
    }
}
