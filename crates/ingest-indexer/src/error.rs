//! Retryable/terminal error taxonomy for the bulk indexer, grounded on the
//! teacher's Raft error type: a tagged enum carrying an `is_retryable()`
//! predicate instead of callers pattern-matching on HTTP status strings.

use thiserror::Error;

/// A failure from submitting a batch to the downstream store.
#[derive(Error, Debug, Clone)]
pub enum IndexerError {
    /// 5xx, 429, or a network-level failure (connect/timeout). Worth
    /// retrying with backoff (§4.I).
    #[error("retryable indexer error: {0}")]
    Retryable(String),
    /// 4xx other than 429, or retries exhausted. The caller routes the
    /// batch's events to DLQ.
    #[error("terminal indexer error: {0}")]
    Terminal(String),
}

impl IndexerError {
    /// Classify an HTTP status code per §4.I's retry policy.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        if status == 429 || (500..600).contains(&status) {
            IndexerError::Retryable(format!("status {status}: {body}"))
        } else {
            IndexerError::Terminal(format!("status {status}: {body}"))
        }
    }

    /// Whether this error should be retried by the caller's backoff loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexerError::Retryable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(IndexerError::from_status(503, "").is_retryable());
        assert!(IndexerError::from_status(429, "").is_retryable());
    }

    #[test]
    fn client_errors_other_than_429_are_terminal() {
        assert!(!IndexerError::from_status(400, "").is_retryable());
        assert!(!IndexerError::from_status(404, "").is_retryable());
    }
}
