//! The nil DLQ backend (§4.J: "a nil writer is a valid disabled state").

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_types::DlqRecord;

use crate::error::DlqError;
use crate::writer::{DlqStats, DlqWriter};

/// Silently drops every write, logging each one. Used when the operator has
/// not configured a DLQ backend.
#[derive(Default)]
pub struct NoopDlqBackend;

#[async_trait]
impl DlqWriter for NoopDlqBackend {
    async fn write(&self, record: DlqRecord) -> Result<(), DlqError> {
        tracing::warn!(
            event_id = %record.envelope.id,
            reason = %record.reason,
            "DLQ disabled, dropping failed event"
        );
        Ok(())
    }

    async fn list(&self, _limit: usize) -> Result<Vec<DlqRecord>, DlqError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _timestamp: DateTime<Utc>) -> Result<(), DlqError> {
        Ok(())
    }

    async fn purge(&self) -> Result<(), DlqError> {
        Ok(())
    }

    async fn stats(&self) -> DlqStats {
        DlqStats::default()
    }
}
