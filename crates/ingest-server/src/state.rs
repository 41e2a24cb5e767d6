//! Shared application state, wired once at startup and handed to every
//! handler behind an `Arc` (§9: "no hidden singletons in hot paths").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ingest_ack::AckManager;
use ingest_auth::CredentialValidator;
use ingest_bus::EventQueue;
use ingest_metrics::IngestMetrics;
use ingest_ratelimit::RateLimiter;

use crate::config::IngestConfig;
use crate::stats::StatsCollector;
use crate::worker::QueuedEnvelope;

/// Everything an HTTP handler needs to serve a request.
#[derive(Clone)]
pub struct AppState {
    /// Parsed, immutable configuration.
    pub config: Arc<IngestConfig>,
    /// Credential validator; `None` is reported as `not configured` (§4.A).
    pub credential_validator: Option<Arc<dyn CredentialValidator>>,
    /// Pre-auth rate limiter, keyed by source IP.
    pub ip_limiter: Arc<dyn RateLimiter>,
    /// Post-auth rate limiter, keyed by validated token id.
    pub token_limiter: Arc<dyn RateLimiter>,
    /// Bounded admission queue.
    pub queue: Arc<EventQueue<QueuedEnvelope>>,
    /// Ack manager.
    pub ack: Arc<AckManager>,
    /// Best-effort per-token stats.
    pub stats: Arc<StatsCollector>,
    /// Prometheus metrics.
    pub metrics: Arc<IngestMetrics>,
    /// Flips to `true` once startup (template/policy/alias setup) finishes;
    /// gates `/readyz` alongside queue-not-full.
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    /// Mark the service ready to receive traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
    }

    /// Whether `/readyz` should report healthy: startup finished and the
    /// admission queue isn't already saturated.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed) && self.queue.depth() < self.queue.capacity()
    }
}
