//! Subject-partitioned durable log backed by sled.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;

use crate::error::StoreError;

/// A single durably-stored message, as returned by [`DurableStream::read_from`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic sequence number within the subject, assigned at publish time.
    pub sequence: u64,
    /// UTC publish time.
    pub published_at: DateTime<Utc>,
    /// Raw message bytes (typically a JSON-encoded record).
    pub payload: Vec<u8>,
}

/// Aggregate stats for a single subject (§4.J: "total messages/bytes and
/// consumer count" for the stream backend).
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamStats {
    /// Number of messages currently retained for the subject.
    pub message_count: u64,
    /// Total bytes of payload currently retained for the subject.
    pub total_bytes: u64,
}

/// A durable, subject-partitioned append-only stream.
///
/// Each subject gets its own sled tree; within a subject, messages are keyed
/// by an 8-byte big-endian sequence number so iteration order is publish
/// order. Reading is always "from the first sequence" (§4.J) via an ephemeral
/// consumer — there is no persisted consumer offset, matching the spec's
/// current scope (replay/offset tracking is a §9 Open Question, not decided
/// here for the subscriber flavor either).
#[derive(Debug)]
pub struct DurableStream {
    db: Db,
}

impl DurableStream {
    /// Open (or create) a durable stream rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self { db: sled::open(path)? })
    }

    /// An ephemeral, non-persistent stream for tests.
    pub fn temporary() -> Result<Self, StoreError> {
        Ok(Self { db: sled::Config::new().temporary(true).open()? })
    }

    fn tree(&self, subject: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(subject)?)
    }

    /// Publish `payload` to `subject`, returning the assigned sequence number.
    pub fn publish(&self, subject: &str, payload: &[u8]) -> Result<u64, StoreError> {
        let tree = self.tree(subject)?;
        let sequence = self.db.generate_id()?;
        let message = Message { sequence, published_at: Utc::now(), payload: payload.to_vec() };
        let bytes = serde_json::to_vec(&message).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tree.insert(sequence.to_be_bytes(), bytes)?;
        Ok(sequence)
    }

    /// An ephemeral consumer reading `subject` from its first sequence,
    /// up to `limit` messages (§4.J `list(limit)`).
    pub fn read_from_start(&self, subject: &str, limit: usize) -> Result<Vec<Message>, StoreError> {
        let tree = self.tree(subject)?;
        let mut out = Vec::new();
        for item in tree.iter().take(limit) {
            let (_, bytes) = item?;
            let message: Message =
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))?;
            out.push(message);
        }
        Ok(out)
    }

    /// Remove a single message by sequence number (§4.J `delete(timestamp)`
    /// callers resolve the timestamp to a sequence number first).
    pub fn delete(&self, subject: &str, sequence: u64) -> Result<(), StoreError> {
        self.tree(subject)?.remove(sequence.to_be_bytes())?;
        Ok(())
    }

    /// Remove every message for `subject` (§4.J `purge`).
    pub fn purge(&self, subject: &str) -> Result<(), StoreError> {
        self.tree(subject)?.clear()?;
        Ok(())
    }

    /// Aggregate stats for `subject`.
    pub fn stats(&self, subject: &str) -> Result<StreamStats, StoreError> {
        let tree = self.tree(subject)?;
        let mut total_bytes = 0u64;
        let mut message_count = 0u64;
        for item in tree.iter() {
            let (_, bytes) = item?;
            total_bytes += bytes.len() as u64;
            message_count += 1;
        }
        Ok(StreamStats { message_count, total_bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_read_preserves_order() {
        let stream = DurableStream::temporary().unwrap();
        stream.publish("ingest.dlq.no_normalizer", b"one").unwrap();
        stream.publish("ingest.dlq.no_normalizer", b"two").unwrap();

        let messages = stream.read_from_start("ingest.dlq.no_normalizer", 10).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload, b"one");
        assert_eq!(messages[1].payload, b"two");
        assert!(messages[0].sequence < messages[1].sequence);
    }

    #[test]
    fn subjects_are_independent() {
        let stream = DurableStream::temporary().unwrap();
        stream.publish("a", b"x").unwrap();
        stream.publish("b", b"y").unwrap();
        assert_eq!(stream.read_from_start("a", 10).unwrap().len(), 1);
        assert_eq!(stream.read_from_start("b", 10).unwrap().len(), 1);
    }

    #[test]
    fn purge_removes_all_messages() {
        let stream = DurableStream::temporary().unwrap();
        stream.publish("s", b"x").unwrap();
        stream.publish("s", b"y").unwrap();
        stream.purge("s").unwrap();
        assert!(stream.read_from_start("s", 10).unwrap().is_empty());
        assert_eq!(stream.stats("s").unwrap().message_count, 0);
    }
}
