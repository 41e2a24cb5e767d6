//! The stable error-reason taxonomy (§7), attached to DLQ records and metrics labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable reason token. Kept as an enum (not a bare string) so the taxonomy
/// can't silently drift between the HTTP boundary, the pipeline, and the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Non-POST method at the HEC boundary.
    InvalidMethod,
    /// Body did not parse as JSON/NDJSON.
    InvalidFormat,
    /// Empty request body.
    NoData,
    /// Missing or invalid bearer token.
    Unauthorized,
    /// IP or token rate limit exceeded.
    RateLimited,
    /// Event queue was full at admission time.
    QueueFull,
    /// No normalizer in the registry matched `(format, source_type)`.
    NoNormalizer,
    /// A matched normalizer returned an error.
    NormalizationFailed,
    /// The validator chain rejected the normalized event.
    ValidationFailed,
    /// A transport-level indexer failure that is retryable (5xx/429/network).
    StorageRetryable,
    /// A terminal indexer failure (4xx other than 429, or retries exhausted).
    StorageTerminal,
    /// An operation exceeded its deadline.
    Timeout,
    /// An operation was aborted by shutdown/cancellation.
    Cancelled,
}

impl Reason {
    /// The stable string token used as a metrics label and DLQ subject suffix.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::InvalidMethod => "invalid_method",
            Reason::InvalidFormat => "invalid_format",
            Reason::NoData => "no_data",
            Reason::Unauthorized => "unauthorized",
            Reason::RateLimited => "rate_limited",
            Reason::QueueFull => "queue_full",
            Reason::NoNormalizer => "no_normalizer",
            Reason::NormalizationFailed => "normalization_failed",
            Reason::ValidationFailed => "validation_failed",
            Reason::StorageRetryable => "storage_retryable",
            Reason::StorageTerminal => "storage_terminal",
            Reason::Timeout => "timeout",
            Reason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
