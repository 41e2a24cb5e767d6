//! The file DLQ backend (§4.J.1): single-process, one JSON file per failure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_types::DlqRecord;
use tokio::fs;

use crate::error::DlqError;
use crate::writer::{DlqStats, DlqWriter};

/// Writes each failure as `failed_<unix_nanos>_<counter>.json` in `dir`.
/// The counter disambiguates failures landing in the same nanosecond.
pub struct FileDlqBackend {
    dir: PathBuf,
    counter: AtomicU64,
    written: AtomicU64,
}

impl FileDlqBackend {
    /// Use (and create, if absent) `dir` as the DLQ directory.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, DlqError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, counter: AtomicU64::new(0), written: AtomicU64::new(0) })
    }

    async fn entries(&self) -> Result<Vec<PathBuf>, DlqError> {
        let mut reader = fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }
        // `failed_<unix_nanos>_<counter>.json` sorts lexicographically in
        // timestamp order since nanos are fixed-width decimal.
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl DlqWriter for FileDlqBackend {
    async fn write(&self, record: DlqRecord) -> Result<(), DlqError> {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(record.file_name(counter));
        let bytes = serde_json::to_vec_pretty(&record)?;
        fs::write(path, bytes).await?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list(&self, limit: usize) -> Result<Vec<DlqRecord>, DlqError> {
        let mut records = Vec::new();
        for path in self.entries().await?.into_iter().take(limit) {
            let bytes = fs::read(&path).await?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }

    async fn delete(&self, timestamp: DateTime<Utc>) -> Result<(), DlqError> {
        for path in self.entries().await? {
            let bytes = fs::read(&path).await?;
            let record: DlqRecord = serde_json::from_slice(&bytes)?;
            if record.timestamp == timestamp {
                fs::remove_file(&path).await?;
                return Ok(());
            }
        }
        Ok(())
    }

    async fn purge(&self) -> Result<(), DlqError> {
        for path in self.entries().await? {
            fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn stats(&self) -> DlqStats {
        DlqStats { written: self.written.load(Ordering::Relaxed), remote_message_count: None, remote_total_bytes: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_types::{RawEnvelope, Reason};
    use serde_json::json;

    fn envelope() -> RawEnvelope {
        RawEnvelope::new("json", "myapp:custom", json!({"msg": "hi"}))
    }

    #[tokio::test]
    async fn write_then_list_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileDlqBackend::new(dir.path()).await.unwrap();
        backend.write(DlqRecord::new(envelope(), Reason::NoNormalizer, "boom")).await.unwrap();
        let records = backend.list(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error_string, "boom");
        assert_eq!(backend.stats().await.written, 1);
    }

    #[tokio::test]
    async fn purge_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileDlqBackend::new(dir.path()).await.unwrap();
        backend.write(DlqRecord::new(envelope(), Reason::NoNormalizer, "one")).await.unwrap();
        backend.write(DlqRecord::new(envelope(), Reason::ValidationFailed, "two")).await.unwrap();
        backend.purge().await.unwrap();
        assert!(backend.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_matching_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileDlqBackend::new(dir.path()).await.unwrap();
        let record = DlqRecord::new(envelope(), Reason::NoNormalizer, "boom");
        let timestamp = record.timestamp;
        backend.write(record).await.unwrap();
        backend.delete(timestamp).await.unwrap();
        assert!(backend.list(10).await.unwrap().is_empty());
    }
}
