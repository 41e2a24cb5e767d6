//! DLQ record shape written by both dead-letter backends (§4.J).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::RawEnvelope;
use crate::reason::Reason;

/// A single dead-lettered event: the original envelope plus failure context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqRecord {
    /// UTC timestamp of the failed attempt.
    pub timestamp: DateTime<Utc>,
    /// The envelope that failed to normalize, validate, or index.
    pub envelope: RawEnvelope,
    /// Human-readable error string, preserved from the underlying failure.
    pub error_string: String,
    /// Stable reason token (also used as a metrics label and, for the stream
    /// backend, as the per-reason subject suffix).
    pub reason: Reason,
    /// Number of attempts made before giving up. The stream backend's producer
    /// currently always writes `1` here (§9 Open Question c); the field exists
    /// for a future replay feature.
    pub attempts: u32,
    /// UTC timestamp of the last attempt (equal to `timestamp` today).
    pub last_attempt: DateTime<Utc>,
}

impl DlqRecord {
    /// Build a DLQ record for a single failed attempt.
    pub fn new(envelope: RawEnvelope, reason: Reason, error_string: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            timestamp: now,
            envelope,
            error_string: error_string.into(),
            reason,
            attempts: 1,
            last_attempt: now,
        }
    }

    /// Filename for the file backend: `failed_<unix_nanos>_<counter>.json`.
    pub fn file_name(&self, counter: u64) -> String {
        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or_default();
        format!("failed_{nanos}_{counter}.json")
    }
}
