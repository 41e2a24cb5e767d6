//! Stats Collector (§4.N, supplemented): best-effort aggregation of
//! per-token request counters, flushed periodically to a shared sink. Flush
//! failures are logged, never propagated — this path must never slow down
//! or fail the HEC hot path.
//!
//! Grounded on the same periodic-worker-with-shutdown-channel shape as the
//! Ack Manager's cleanup job (§4.D), generalized to a second background
//! task with its own cadence.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Default flush interval (§4.N: 30s).
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Per-token counters accumulated between flushes.
#[derive(Debug, Clone, Default)]
pub struct TokenStats {
    /// Requests seen for this token since the last flush.
    pub count: u64,
    /// Distinct source IPs seen for this token since the last flush.
    pub source_ips: Vec<IpAddr>,
    /// UTC time of the most recent request.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Where flushed per-token snapshots land. The in-process map is the only
/// shipped implementation; a Redis-backed sink is a pluggable alternative
/// gated by `redis.enabled` that this deployment does not implement (see
/// DESIGN.md) — flushing to it currently only logs that it was requested.
pub trait StatsSink: Send + Sync {
    /// Publish one token's accumulated snapshot.
    fn publish(&self, token_id: &str, stats: &TokenStats);
}

/// The default sink: an in-process map, queryable directly by callers in the
/// same process (e.g. a future stats HTTP surface).
#[derive(Default)]
pub struct InMemoryStatsSink {
    published: DashMap<String, TokenStats>,
}

impl InMemoryStatsSink {
    /// A fresh, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published snapshot for `token_id`, if any.
    pub fn get(&self, token_id: &str) -> Option<TokenStats> {
        self.published.get(token_id).map(|entry| entry.clone())
    }
}

impl StatsSink for InMemoryStatsSink {
    fn publish(&self, token_id: &str, stats: &TokenStats) {
        self.published.insert(token_id.to_string(), stats.clone());
    }
}

/// A sink that only logs that a Redis-backed flush was requested; selected
/// when `redis.enabled = true` since no Redis client dependency is wired up.
#[derive(Default)]
pub struct UnimplementedRedisSink;

impl StatsSink for UnimplementedRedisSink {
    fn publish(&self, token_id: &str, _stats: &TokenStats) {
        tracing::warn!(token_id, "redis-backed stats sink is not implemented; dropping flush");
    }
}

/// Accumulates per-token counters in-process, best-effort (never blocks the
/// HEC hot path), and flushes them to a [`StatsSink`] on a periodic tick.
pub struct StatsCollector {
    accumulating: DashMap<String, TokenStats>,
    sink: Arc<dyn StatsSink>,
}

impl StatsCollector {
    /// Build a collector flushing into `sink`.
    pub fn new(sink: Arc<dyn StatsSink>) -> Arc<Self> {
        Arc::new(Self { accumulating: DashMap::new(), sink })
    }

    /// Record one request for `token_id` from `source_ip` (§4.C step 12:
    /// "best-effort, never blocks the hot path"). Never returns an error;
    /// callers should call this fire-and-forget.
    pub fn record(&self, token_id: &str, source_ip: IpAddr) {
        let mut entry = self.accumulating.entry(token_id.to_string()).or_default();
        entry.count += 1;
        if !entry.source_ips.contains(&source_ip) {
            entry.source_ips.push(source_ip);
        }
        entry.last_seen = Some(Utc::now());
    }

    /// Flush every accumulated token's counters to the sink, then reset them
    /// (§4.N: "counters are reset after a successful flush and
    /// re-accumulated in between").
    fn flush(&self) {
        let snapshot: HashMap<String, TokenStats> =
            self.accumulating.iter().map(|entry| (entry.key().clone(), entry.value().clone())).collect();
        for (token_id, stats) in &snapshot {
            self.sink.publish(token_id, stats);
        }
        for token_id in snapshot.keys() {
            self.accumulating.remove(token_id);
        }
    }

    /// Spawn the periodic flush worker.
    pub fn spawn_flush_worker(self: &Arc<Self>) -> (JoinHandle<()>, oneshot::Sender<()>) {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let collector = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => collector.flush(),
                    _ = &mut shutdown_rx => {
                        collector.flush();
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
    use std::net::Ipv4Addr;

    #[test]
    fn record_then_flush_publishes_and_resets() {
        let sink = Arc::new(InMemoryStatsSink::new());
        let collector = StatsCollector::new(sink.clone());
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        collector.record("tok-a", ip);
        collector.record("tok-a", ip);
        collector.flush();

        let published = sink.get("tok-a").expect("published");
        assert_eq!(published.count, 2);
        assert_eq!(published.source_ips, vec![ip]);

        // Reset after flush: a stale snapshot is not re-published without new activity.
        collector.flush();
        assert_eq!(sink.get("tok-a").unwrap().count, 2, "sink keeps the last published snapshot");
    }

    #[test]
    fn distinct_source_ips_are_deduplicated() {
        let sink = Arc::new(InMemoryStatsSink::new());
        let collector = StatsCollector::new(sink.clone());
        let (a, b) = (IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), IpAddr::V4(Ipv4Addr::new(2, 2, 2, 2)));

        collector.record("tok-b", a);
        collector.record("tok-b", a);
        collector.record("tok-b", b);
        collector.flush();

        assert_eq!(sink.get("tok-b").unwrap().source_ips.len(), 2);
    }
}
