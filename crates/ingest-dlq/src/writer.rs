//! The DLQ writer contract (§4.J): both backends expose the same surface so
//! the pipeline worker never needs to know which one is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_types::DlqRecord;

use crate::error::DlqError;

/// Aggregate counters for a DLQ backend. `written` is always a local,
/// in-process counter; `remote` is populated only by the stream backend,
/// which can see total messages/bytes across every producer (§4.J).
#[derive(Debug, Clone, Default)]
pub struct DlqStats {
    /// Records written by this process since startup.
    pub written: u64,
    /// Total messages currently retained, if the backend can see across
    /// processes.
    pub remote_message_count: Option<u64>,
    /// Total bytes currently retained, if the backend can see across
    /// processes.
    pub remote_total_bytes: Option<u64>,
}

/// A dead-letter queue backend.
#[async_trait]
pub trait DlqWriter: Send + Sync {
    /// Append a failed event.
    async fn write(&self, record: DlqRecord) -> Result<(), DlqError>;

    /// The most recent `limit` records (oldest-first for the file backend,
    /// stream-order per reason for the stream backend).
    async fn list(&self, limit: usize) -> Result<Vec<DlqRecord>, DlqError>;

    /// Remove the record with this exact timestamp, if present.
    async fn delete(&self, timestamp: DateTime<Utc>) -> Result<(), DlqError>;

    /// Remove every record.
    async fn purge(&self) -> Result<(), DlqError>;

    /// Current aggregate stats.
    async fn stats(&self) -> DlqStats;
}
