//! Errors surfaced by metric registration and encoding.

/// Failure registering or rendering metrics.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// A `prometheus` registration or encoding call failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
