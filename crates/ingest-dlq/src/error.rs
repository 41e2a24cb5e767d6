//! Errors shared by every DLQ backend.

use thiserror::Error;

/// Failure writing, reading, or managing dead-lettered events.
#[derive(Error, Debug)]
pub enum DlqError {
    /// The file backend's directory couldn't be read or written.
    #[error("dlq filesystem error: {0}")]
    Io(#[from] std::io::Error),
    /// The stream backend's durable store failed.
    #[error("dlq store error: {0}")]
    Store(#[from] ingest_store::StoreError),
    /// A stored record failed to (de)serialize.
    #[error("dlq record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
