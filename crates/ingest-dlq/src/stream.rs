//! The durable-stream DLQ backend (§4.J.2): multi-process, one subject per
//! failure reason on [`ingest_store::DurableStream`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_store::DurableStream;
use ingest_types::{DlqRecord, Reason};

use crate::error::DlqError;
use crate::writer::{DlqStats, DlqWriter};

const ALL_REASONS: [Reason; 13] = [
    Reason::InvalidMethod,
    Reason::InvalidFormat,
    Reason::NoData,
    Reason::Unauthorized,
    Reason::RateLimited,
    Reason::QueueFull,
    Reason::NoNormalizer,
    Reason::NormalizationFailed,
    Reason::ValidationFailed,
    Reason::StorageRetryable,
    Reason::StorageTerminal,
    Reason::Timeout,
    Reason::Cancelled,
];

fn subject_for(reason: Reason) -> String {
    format!("ingest.dlq.{}", reason.as_str())
}

/// Writes failures to the subject `ingest.dlq.<reason>`.
pub struct StreamDlqBackend {
    stream: Arc<DurableStream>,
    written: AtomicU64,
}

impl StreamDlqBackend {
    /// Build a backend over an existing durable stream.
    pub fn new(stream: Arc<DurableStream>) -> Self {
        Self { stream, written: AtomicU64::new(0) }
    }
}

#[async_trait]
impl DlqWriter for StreamDlqBackend {
    async fn write(&self, record: DlqRecord) -> Result<(), DlqError> {
        let subject = subject_for(record.reason);
        let bytes = serde_json::to_vec(&record)?;
        self.stream.publish(&subject, &bytes)?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<DlqRecord>, DlqError> {
        // No cross-subject consumer offset exists, so each reason's subject
        // is read from its first sequence (§4.J) and the results merged by
        // publish time, then capped at `limit`.
        let mut records = Vec::new();
        for reason in ALL_REASONS {
            let subject = subject_for(reason);
            for message in self.stream.read_from_start(&subject, limit)? {
                records.push(serde_json::from_slice::<DlqRecord>(&message.payload)?);
            }
        }
        records.sort_by_key(|record| record.timestamp);
        records.truncate(limit);
        Ok(records)
    }

    async fn delete(&self, timestamp: DateTime<Utc>) -> Result<(), DlqError> {
        for reason in ALL_REASONS {
            let subject = subject_for(reason);
            for message in self.stream.read_from_start(&subject, usize::MAX)? {
                let record: DlqRecord = serde_json::from_slice(&message.payload)?;
                if record.timestamp == timestamp {
                    self.stream.delete(&subject, message.sequence)?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    async fn purge(&self) -> Result<(), DlqError> {
        for reason in ALL_REASONS {
            self.stream.purge(&subject_for(reason))?;
        }
        Ok(())
    }

    async fn stats(&self) -> DlqStats {
        let mut message_count = 0;
        let mut total_bytes = 0;
        for reason in ALL_REASONS {
            if let Ok(stats) = self.stream.stats(&subject_for(reason)) {
                message_count += stats.message_count;
                total_bytes += stats.total_bytes;
            }
        }
        DlqStats {
            written: self.written.load(Ordering::Relaxed),
            remote_message_count: Some(message_count),
            remote_total_bytes: Some(total_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::RawEnvelope;
    use serde_json::json;

    fn envelope() -> RawEnvelope {
        RawEnvelope::new("json", "myapp:custom", json!({"msg": "hi"}))
    }

    #[tokio::test]
    async fn write_then_list_roundtrips() {
        let stream = Arc::new(DurableStream::temporary().unwrap());
        let backend = StreamDlqBackend::new(stream);
        backend.write(DlqRecord::new(envelope(), Reason::NoNormalizer, "boom")).await.unwrap();
        let records = backend.list(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reason, Reason::NoNormalizer);
    }

    #[tokio::test]
    async fn subjects_are_isolated_per_reason() {
        let stream = Arc::new(DurableStream::temporary().unwrap());
        let backend = StreamDlqBackend::new(stream);
        backend.write(DlqRecord::new(envelope(), Reason::NoNormalizer, "a")).await.unwrap();
        backend.write(DlqRecord::new(envelope(), Reason::ValidationFailed, "b")).await.unwrap();
        let stats = backend.stats().await;
        assert_eq!(stats.remote_message_count, Some(2));
    }

    #[tokio::test]
    async fn purge_clears_every_reason_subject() {
        let stream = Arc::new(DurableStream::temporary().unwrap());
        let backend = StreamDlqBackend::new(stream);
        backend.write(DlqRecord::new(envelope(), Reason::Timeout, "slow")).await.unwrap();
        backend.purge().await.unwrap();
        assert!(backend.list(10).await.unwrap().is_empty());
    }
}
