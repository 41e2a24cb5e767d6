#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-metrics** – Prometheus instrumentation for the ingestion data
//! plane (§4.L).
//!
//! Grounded on the teacher's `MetricsRegistry`, which wraps a
//! `prometheus::Registry` behind a dynamic, dashmap-keyed table of
//! lazily-created counters/gauges/histograms keyed by caller-chosen names.
//! This system's metric surface is fixed by contract rather than
//! discovered at runtime, so [`IngestMetrics`] drops the dynamic table and
//! registers one concrete field per metric up front.

use once_cell::sync::OnceCell;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

mod error;

pub use error::MetricsError;

const NORMALIZATION_BUCKETS: &[f64] = &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];
const STORAGE_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Every metric named in §4.L, registered against a private
/// [`prometheus::Registry`].
pub struct IngestMetrics {
    registry: Registry,

    /// `events_total{endpoint,status}` – accepted HEC submissions.
    pub events_total: CounterVec,
    /// `event_bytes_total` – cumulative bytes of accepted request bodies.
    pub event_bytes_total: prometheus::Counter,
    /// `queue_depth` – current depth of the bounded event queue.
    pub queue_depth: Gauge,
    /// `queue_capacity` – configured capacity of the event queue.
    pub queue_capacity: Gauge,
    /// `normalization_duration_seconds` – pipeline normalize+validate latency.
    pub normalization_duration_seconds: Histogram,
    /// `normalization_errors_total` – events rejected by the pipeline.
    pub normalization_errors_total: prometheus::Counter,
    /// `storage_duration_seconds` – bulk indexer submit latency.
    pub storage_duration_seconds: Histogram,
    /// `storage_errors_total` – documents that failed bulk indexing terminally.
    pub storage_errors_total: prometheus::Counter,
    /// `rate_limit_hits_total{token}` – requests rejected for exceeding quota.
    pub rate_limit_hits_total: CounterVec,
    /// `acks_pending` – acks awaiting resolution.
    pub acks_pending: Gauge,
    /// `acks_completed_total` – acks that resolved to success.
    pub acks_completed_total: prometheus::Counter,
}

impl IngestMetrics {
    /// Build and register every metric against a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let events_total = CounterVec::new(
            Opts::new("events_total", "HEC submissions accepted, by endpoint and outcome"),
            &["endpoint", "status"],
        )?;
        let event_bytes_total = prometheus::Counter::new(
            "event_bytes_total",
            "Cumulative bytes of accepted HEC request bodies",
        )?;
        let queue_depth = Gauge::new("queue_depth", "Current depth of the bounded event queue")?;
        let queue_capacity = Gauge::new("queue_capacity", "Configured capacity of the event queue")?;
        let normalization_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "normalization_duration_seconds",
                "Time spent normalizing and validating a single event",
            )
            .buckets(NORMALIZATION_BUCKETS.to_vec()),
        )?;
        let normalization_errors_total = prometheus::Counter::new(
            "normalization_errors_total",
            "Events rejected by the normalization pipeline",
        )?;
        let storage_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("storage_duration_seconds", "Time spent submitting a bulk indexing batch")
                .buckets(STORAGE_BUCKETS.to_vec()),
        )?;
        let storage_errors_total = prometheus::Counter::new(
            "storage_errors_total",
            "Documents that failed bulk indexing after exhausting retries",
        )?;
        let rate_limit_hits_total = CounterVec::new(
            Opts::new("rate_limit_hits_total", "Requests rejected for exceeding their token's quota"),
            &["token"],
        )?;
        let acks_pending = Gauge::new("acks_pending", "Acks awaiting resolution")?;
        let acks_completed_total =
            prometheus::Counter::new("acks_completed_total", "Acks that resolved to success")?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(event_bytes_total.clone()))?;
        registry.register(Box::new(queue_depth.clone()))?;
        registry.register(Box::new(queue_capacity.clone()))?;
        registry.register(Box::new(normalization_duration_seconds.clone()))?;
        registry.register(Box::new(normalization_errors_total.clone()))?;
        registry.register(Box::new(storage_duration_seconds.clone()))?;
        registry.register(Box::new(storage_errors_total.clone()))?;
        registry.register(Box::new(rate_limit_hits_total.clone()))?;
        registry.register(Box::new(acks_pending.clone()))?;
        registry.register(Box::new(acks_completed_total.clone()))?;

        Ok(Self {
            registry,
            events_total,
            event_bytes_total,
            queue_depth,
            queue_capacity,
            normalization_duration_seconds,
            normalization_errors_total,
            storage_duration_seconds,
            storage_errors_total,
            rate_limit_hits_total,
            acks_pending,
            acks_completed_total,
        })
    }

    /// Render the registry in the Prometheus text exposition format, for
    /// the `/metrics` handler.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf)?;
        Ok(String::from_utf8(buf).expect("prometheus text encoding is always valid utf-8"))
    }

    /// The process-global instance, created on first access.
    ///
    /// Most call sites should prefer constructing an `Arc<IngestMetrics>`
    /// once at startup and threading it through `AppState`; this exists for
    /// code paths (library internals, tests) that have no state to thread
    /// it through.
    pub fn global() -> &'static IngestMetrics {
        static INSTANCE: OnceCell<IngestMetrics> = OnceCell::new();
        INSTANCE.get_or_init(|| IngestMetrics::new().expect("metric registration cannot fail with fixed, non-colliding names"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_every_metric_name() {
        let metrics = IngestMetrics::new().unwrap();
        metrics.events_total.with_label_values(&["event", "accepted"]).inc();
        metrics.queue_depth.set(3.0);
        metrics.normalization_duration_seconds.observe(0.002);

        let text = metrics.encode().unwrap();
        for name in [
            "events_total",
            "event_bytes_total",
            "queue_depth",
            "queue_capacity",
            "normalization_duration_seconds",
            "normalization_errors_total",
            "storage_duration_seconds",
            "storage_errors_total",
            "rate_limit_hits_total",
            "acks_pending",
            "acks_completed_total",
        ] {
            assert!(text.contains(name), "missing metric {name} in encoded output");
        }
    }

    #[test]
    fn counters_and_gauges_accumulate() {
        let metrics = IngestMetrics::new().unwrap();
        metrics.events_total.with_label_values(&["raw", "rejected"]).inc();
        metrics.events_total.with_label_values(&["raw", "rejected"]).inc();
        assert_eq!(metrics.events_total.with_label_values(&["raw", "rejected"]).get(), 2.0);

        metrics.queue_capacity.set(1000.0);
        assert_eq!(metrics.queue_capacity.get(), 1000.0);
    }

    #[test]
    fn global_instance_is_reused() {
        let a = IngestMetrics::global() as *const IngestMetrics;
        let b = IngestMetrics::global() as *const IngestMetrics;
        assert_eq!(a, b);
    }
}
