//! The Ack Manager (§4.D): tracks per-batch delivery state until it
//! resolves or ages out.
//!
//! Grounded on the teacher's orchestration progress monitor — a
//! `DashMap`-keyed table of per-entity state, updated from multiple call
//! sites without a central writer lock — generalized from agent progress
//! records to ack records, with TTL eviction added via a periodic
//! background worker carrying an explicit shutdown channel, the same shape
//! `toka-orchestration-service`'s main loop uses for its own shutdown.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use ingest_types::{AckId, AckRecord, AckStatus};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default ack TTL past last update (`ack.ttl` config key).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
/// Cleanup sweep interval (§4.D: "a background job every minute").
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// An ack record plus the subset of its covered event ids still outstanding.
/// `AckRecord` itself stays a plain data type (`ingest-types` has no logic);
/// the remaining-set bookkeeping that drives partial resolution lives here.
struct Tracked {
    record: AckRecord,
    remaining: HashSet<Uuid>,
}

/// Tracks ack records from creation through resolution or eviction.
pub struct AckManager {
    records: DashMap<AckId, Tracked>,
    pending: AtomicI64,
    ttl: Duration,
}

impl AckManager {
    /// Build a manager with the given TTL.
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self { records: DashMap::new(), pending: AtomicI64::new(0), ttl })
    }

    /// A manager using [`DEFAULT_TTL`].
    pub fn with_default_ttl() -> Arc<Self> {
        Self::new(DEFAULT_TTL)
    }

    /// Allocate a fresh ack covering `event_ids`.
    pub fn create(&self, event_ids: Vec<Uuid>) -> AckId {
        let remaining = event_ids.iter().copied().collect();
        let record = AckRecord::new(event_ids);
        let ack_id = record.ack_id;
        self.records.insert(ack_id, Tracked { record, remaining });
        self.pending.fetch_add(1, Ordering::Relaxed);
        ack_id
    }

    /// Mark `ack_id` successfully delivered outright (used when an ack is
    /// resolved without per-event granularity, e.g. an admission-time
    /// failure before any event reached the pipeline). No-op for unknown or
    /// already-resolved ids (tolerates a race against cleanup or a
    /// duplicate completion signal).
    pub fn complete(&self, ack_id: AckId) {
        self.resolve(ack_id, AckStatus::Success);
    }

    /// Mark `ack_id` failed outright. Same no-op tolerance as [`Self::complete`].
    pub fn fail(&self, ack_id: AckId) {
        self.resolve(ack_id, AckStatus::Failed);
    }

    /// Record that `event_id` (one of `ack_id`'s covered events) was durably
    /// indexed. The ack resolves to `success` once every covered event has
    /// been reported this way. No-op for unknown ids or acks already resolved.
    pub fn complete_event(&self, ack_id: AckId, event_id: Uuid) {
        if let Some(mut tracked) = self.records.get_mut(&ack_id) {
            if tracked.record.status != AckStatus::Pending {
                return;
            }
            tracked.remaining.remove(&event_id);
            if tracked.remaining.is_empty() {
                tracked.record.status = AckStatus::Success;
                tracked.record.updated_at = Utc::now();
                self.pending.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    /// Record that `event_id` terminally failed (DLQ'd). The whole ack fails
    /// immediately — a batch is only as good as its worst member. No-op for
    /// unknown ids or acks already resolved.
    pub fn fail_event(&self, ack_id: AckId, _event_id: Uuid) {
        self.resolve(ack_id, AckStatus::Failed);
    }

    fn resolve(&self, ack_id: AckId, status: AckStatus) {
        if let Some(mut tracked) = self.records.get_mut(&ack_id) {
            if tracked.record.status == AckStatus::Pending {
                tracked.record.status = status;
                tracked.record.updated_at = Utc::now();
                self.pending.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    /// For each requested id, `true` iff its current state is `success`;
    /// everything else (pending, failed, unknown) is `false`, and unknown
    /// ids are absent from the map entirely (§4.D).
    pub fn query(&self, ack_ids: &[AckId]) -> std::collections::HashMap<AckId, bool> {
        ack_ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|tracked| (*id, tracked.record.status == AckStatus::Success)))
            .collect()
    }

    /// Number of acks still pending (the `acks_pending` gauge, §4.L).
    pub fn pending_count(&self) -> i64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Evict every record whose last-change timestamp is older than TTL.
    /// Returns the number evicted; pending evictions have already decremented
    /// the pending gauge.
    fn evict_expired(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let expired: Vec<AckId> = self
            .records
            .iter()
            .filter(|entry| entry.record.updated_at < cutoff)
            .map(|entry| *entry.key())
            .collect();
        for id in &expired {
            if let Some((_, tracked)) = self.records.remove(id) {
                if tracked.record.status == AckStatus::Pending {
                    self.pending.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
        expired.len()
    }

    /// Spawn the periodic cleanup worker. Returns its join handle and a
    /// sender; dropping or firing the sender stops the loop on the next
    /// `tokio::select!` wakeup.
    pub fn spawn_cleanup_worker(self: &Arc<Self>) -> (JoinHandle<()>, oneshot::Sender<()>) {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = manager.evict_expired();
                        if evicted > 0 {
                            tracing::debug!(evicted, "ack cleanup evicted expired records");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("ack cleanup worker shutting down");
                        return;
                    }
                }
            }
        });
        (handle, shutdown_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_query_is_false_while_pending() {
        let manager = AckManager::with_default_ttl();
        let ack_id = manager.create(vec![Uuid::new_v4()]);
        let result = manager.query(&[ack_id]);
        assert_eq!(result.get(&ack_id), Some(&false));
        assert_eq!(manager.pending_count(), 1);
    }

    #[test]
    fn complete_resolves_to_true_and_decrements_pending() {
        let manager = AckManager::with_default_ttl();
        let ack_id = manager.create(vec![Uuid::new_v4()]);
        manager.complete(ack_id);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&true));
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn fail_resolves_to_false() {
        let manager = AckManager::with_default_ttl();
        let ack_id = manager.create(vec![Uuid::new_v4()]);
        manager.fail(ack_id);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&false));
    }

    #[test]
    fn unknown_id_is_absent_not_false() {
        let manager = AckManager::with_default_ttl();
        let bogus = Uuid::new_v4();
        assert!(manager.query(&[bogus]).get(&bogus).is_none());
    }

    #[test]
    fn resolve_is_a_no_op_for_unknown_ids() {
        let manager = AckManager::with_default_ttl();
        manager.complete(Uuid::new_v4());
        manager.fail(Uuid::new_v4());
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn double_resolution_keeps_first_outcome() {
        let manager = AckManager::with_default_ttl();
        let ack_id = manager.create(vec![Uuid::new_v4()]);
        manager.complete(ack_id);
        manager.fail(ack_id);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&true));
    }

    #[test]
    fn ack_succeeds_only_once_every_covered_event_completes() {
        let manager = AckManager::with_default_ttl();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ack_id = manager.create(vec![a, b]);

        manager.complete_event(ack_id, a);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&false));
        assert_eq!(manager.pending_count(), 1);

        manager.complete_event(ack_id, b);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&true));
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn one_failed_event_fails_the_whole_ack() {
        let manager = AckManager::with_default_ttl();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ack_id = manager.create(vec![a, b]);

        manager.complete_event(ack_id, a);
        manager.fail_event(ack_id, b);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&false));

        // Further resolution attempts are no-ops once the ack is settled.
        manager.complete_event(ack_id, a);
        assert_eq!(manager.query(&[ack_id]).get(&ack_id), Some(&false));
    }

    #[tokio::test]
    async fn expired_records_are_evicted() {
        let manager = AckManager::new(Duration::from_millis(0));
        let ack_id = manager.create(vec![Uuid::new_v4()]);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(manager.evict_expired(), 1);
        assert!(manager.query(&[ack_id]).get(&ack_id).is_none());
        assert_eq!(manager.pending_count(), 0);
    }
}
