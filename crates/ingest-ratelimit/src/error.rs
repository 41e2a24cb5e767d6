//! Rate limiter error type.

use thiserror::Error;

/// Errors surfaced by a [`crate::RateLimitStorage`] backend.
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// The backing store (in-memory lock, network cache, etc.) failed.
    #[error("rate limit storage error: {0}")]
    Storage(String),
}
