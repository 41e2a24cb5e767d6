//! Pipeline worker pool (§4.H, §5): workers pull envelopes off the Event
//! Queue, run them through the normalization pipeline, and hand successful
//! canonical events to a shared batching indexer. Failures at any stage are
//! routed to DLQ and fail the covering ack, never propagated to the
//! already-responded HTTP client (§7).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use ingest_ack::AckManager;
use ingest_dlq::DlqWriter;
use ingest_indexer::{Batcher, BulkIndexer};
use ingest_metrics::IngestMetrics;
use ingest_normalize::Pipeline;
use ingest_types::{AckId, DlqRecord, RawEnvelope, Reason};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Flush interval for the time-triggered side of the batcher (§4.I: default 1s).
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// An admitted envelope plus the ack id (if any) it counts toward.
pub struct QueuedEnvelope {
    /// The envelope to normalize, validate, and index.
    pub envelope: RawEnvelope,
    /// The ack this envelope's outcome resolves, if the client requested one.
    pub ack_id: Option<AckId>,
}

struct PendingDoc {
    envelope: RawEnvelope,
    ack_id: Option<AckId>,
}

/// Shared batching/indexing/DLQ/ack plumbing a pool of pipeline workers feed into.
pub struct IndexingPipeline {
    batcher: Batcher<(Uuid, Value)>,
    pending: DashMap<Uuid, PendingDoc>,
    indexer: Arc<BulkIndexer>,
    dlq: Arc<dyn DlqWriter>,
    ack: Arc<AckManager>,
    metrics: Arc<IngestMetrics>,
}

impl IndexingPipeline {
    /// Build a pipeline with the default batch size (§4.I: 100).
    pub fn new(indexer: Arc<BulkIndexer>, dlq: Arc<dyn DlqWriter>, ack: Arc<AckManager>, metrics: Arc<IngestMetrics>) -> Arc<Self> {
        Arc::new(Self {
            batcher: Batcher::new(Batcher::<(Uuid, Value)>::DEFAULT_BATCH_SIZE),
            pending: DashMap::new(),
            indexer,
            dlq,
            ack,
            metrics,
        })
    }

    /// A successfully normalized document: queue it for the next batch,
    /// flushing immediately if this push reaches the size threshold.
    pub async fn submit(&self, envelope: RawEnvelope, ack_id: Option<AckId>, document: Value) {
        let event_id = envelope.id;
        self.pending.insert(event_id, PendingDoc { envelope, ack_id });
        if let Some(batch) = self.batcher.push((event_id, document)).await {
            self.flush(batch).await;
        }
    }

    /// Force-drain and submit whatever has accumulated, regardless of size.
    /// Called by the time-based flush tick.
    pub async fn flush_pending(&self) {
        let batch = self.batcher.take().await;
        if !batch.is_empty() {
            self.flush(batch).await;
        }
    }

    async fn flush(&self, batch: Vec<(Uuid, Value)>) {
        let event_ids: Vec<Uuid> = batch.iter().map(|(id, _)| *id).collect();
        match self.indexer.submit(&batch).await {
            Ok(result) => {
                let mut seen: HashSet<Uuid> = HashSet::new();
                for outcome in &result.outcomes {
                    seen.insert(outcome.event_id);
                    match &outcome.error {
                        None => self.resolve_success(outcome.event_id).await,
                        Some(err) => self.resolve_failure(outcome.event_id, Reason::StorageTerminal, err.clone()).await,
                    }
                }
                // A store that silently drops a document from its response is
                // treated the same as an explicit per-document failure.
                for id in event_ids {
                    if !seen.contains(&id) {
                        self.resolve_failure(id, Reason::StorageTerminal, "missing from bulk response".to_string()).await;
                    }
                }
            }
            Err(err) => {
                self.metrics.storage_errors_total.inc_by(event_ids.len() as f64);
                let reason = if err.is_retryable() { Reason::StorageRetryable } else { Reason::StorageTerminal };
                for id in event_ids {
                    self.resolve_failure(id, reason, err.to_string()).await;
                }
            }
        }
    }

    async fn resolve_success(&self, event_id: Uuid) {
        if let Some((_, doc)) = self.pending.remove(&event_id) {
            if let Some(ack_id) = doc.ack_id {
                self.ack.complete_event(ack_id, event_id);
                self.metrics.acks_completed_total.inc();
            }
        }
    }

    async fn resolve_failure(&self, event_id: Uuid, reason: Reason, error_string: String) {
        if let Some((_, doc)) = self.pending.remove(&event_id) {
            if let Some(ack_id) = doc.ack_id {
                self.ack.fail_event(ack_id, event_id);
            }
            self.metrics.storage_errors_total.inc();
            let record = DlqRecord::new(doc.envelope, reason, error_string);
            if let Err(err) = self.dlq.write(record).await {
                tracing::warn!(error = %err, %event_id, "failed to write DLQ record");
            }
        }
    }
}

/// Spawn the periodic time-based flush ticker. Returns its join handle and a
/// shutdown sender.
pub fn spawn_flush_ticker(pipeline: Arc<IndexingPipeline>) -> (JoinHandle<()>, oneshot::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => pipeline.flush_pending().await,
                _ = &mut shutdown_rx => {
                    pipeline.flush_pending().await;
                    return;
                }
            }
        }
    });
    (handle, shutdown_tx)
}

/// Everything one worker loop needs, shared across the pool.
pub struct WorkerContext {
    /// Bounded admission queue workers pull from.
    pub queue: Arc<ingest_bus::EventQueue<QueuedEnvelope>>,
    /// Normalize + validate.
    pub pipeline: Arc<Pipeline>,
    /// Batching/indexing/DLQ/ack plumbing.
    pub indexing: Arc<IndexingPipeline>,
    /// DLQ writer, used directly for pipeline-stage (pre-indexing) failures.
    pub dlq: Arc<dyn DlqWriter>,
    /// Ack manager, used directly for pipeline-stage failures.
    pub ack: Arc<AckManager>,
    /// Metrics.
    pub metrics: Arc<IngestMetrics>,
}

/// Spawn `count` worker loops pulling from `ctx.queue`. Returns their join
/// handles; workers exit once the queue is closed and drained.
pub fn spawn_workers(ctx: Arc<WorkerContext>, count: usize) -> Vec<JoinHandle<()>> {
    (0..count.max(1)).map(|id| {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { worker_loop(id, ctx).await })
    }).collect()
}

async fn worker_loop(id: usize, ctx: Arc<WorkerContext>) {
    tracing::debug!(worker_id = id, "pipeline worker started");
    while let Some(queued) = ctx.queue.dequeue().await {
        let QueuedEnvelope { envelope, ack_id } = queued;
        match ctx.pipeline.process(&envelope) {
            Ok(canonical) => {
                let document = canonical.to_document();
                ctx.indexing.submit(envelope, ack_id, document).await;
            }
            Err(err) => {
                let reason = err.reason();
                if reason == Reason::NormalizationFailed {
                    ctx.metrics.normalization_errors_total.inc();
                }
                if let Some(ack_id) = ack_id {
                    ctx.ack.fail(ack_id);
                }
                let record = DlqRecord::new(envelope, reason, err.to_string());
                if let Err(dlq_err) = ctx.dlq.write(record).await {
                    tracing::warn!(error = %dlq_err, "failed to write DLQ record for pipeline failure");
                }
            }
        }
    }
    tracing::debug!(worker_id = id, "pipeline worker shutting down (queue closed)");
}
