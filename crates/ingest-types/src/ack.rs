//! Ack records tracked by the Ack Manager (§4.D).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque ack identifier returned to HEC clients that set `X-Splunk-Request-Channel`.
pub type AckId = Uuid;

/// Lifecycle state of an ack record (§3 I3: every ack ends in `Success` or `Failed`
/// before TTL elapses, or is garbage-collected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Created, not yet resolved.
    Pending,
    /// All covered events were durably indexed.
    Success,
    /// At least one covered event terminally failed (DLQ'd) before completion.
    Failed,
}

/// A tracked delivery acknowledgement covering one or more event ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckRecord {
    /// Unique id handed back to the HEC client.
    pub ack_id: AckId,
    /// Current lifecycle state.
    pub status: AckStatus,
    /// UTC timestamp of the last state change; drives TTL eviction.
    pub updated_at: DateTime<Utc>,
    /// Envelope ids this ack covers.
    pub event_ids: Vec<Uuid>,
}

impl AckRecord {
    /// Create a fresh, pending ack record covering `event_ids`.
    pub fn new(event_ids: Vec<Uuid>) -> Self {
        Self {
            ack_id: Uuid::new_v4(),
            status: AckStatus::Pending,
            updated_at: Utc::now(),
            event_ids,
        }
    }
}
