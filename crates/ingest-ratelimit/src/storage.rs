//! Storage backends for sliding-window rate limit counters.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RateLimitError;

/// Backend contract for sliding-window counters, evaluated atomically per key.
#[async_trait]
pub trait RateLimitStorage: Send + Sync {
    /// Prune entries older than `now - window`, record one admission attempt at
    /// `now`, and return the resulting count in the window (including this
    /// attempt). Callers compare the returned count against their configured
    /// limit; the storage itself is limit-agnostic except where pruning needs
    /// to know the window.
    async fn record_and_count(&self, key: &str, window: Duration, limit: u32) -> Result<u32, RateLimitError>;
}

/// In-memory sliding-window storage.
///
/// Suitable for a single-process deployment; distributed deployments that
/// share counters across instances plug in a different [`RateLimitStorage`]
/// implementation (e.g. backed by a shared cache) behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStorage {
    windows: RwLock<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl MemoryRateLimitStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self { windows: RwLock::new(HashMap::new()) }
    }
}

#[async_trait]
impl RateLimitStorage for MemoryRateLimitStorage {
    async fn record_and_count(&self, key: &str, window: Duration, limit: u32) -> Result<u32, RateLimitError> {
        let now = Utc::now();
        let cutoff = now - window;

        let mut windows = self.windows.write().await;
        let entries = windows.entry(key.to_string()).or_default();

        while let Some(front) = entries.front() {
            if *front < cutoff {
                entries.pop_front();
            } else {
                break;
            }
        }

        // Only record the attempt if it would not itself exceed the limit,
        // matching §4.B: "accept-and-record if count<N, else deny" — a denied
        // request does not consume a slot in the window.
        let count = entries.len() as u32;
        if count < limit {
            entries.push_back(now);
            debug!(key, count = count + 1, limit, "rate limit admitted");
            Ok(count + 1)
        } else {
            debug!(key, count, limit, "rate limit denied");
            Ok(count + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prunes_entries_outside_window() {
        let storage = MemoryRateLimitStorage::new();
        let window = Duration::milliseconds(50);

        assert_eq!(storage.record_and_count("k", window, 2).await.unwrap(), 1);
        assert_eq!(storage.record_and_count("k", window, 2).await.unwrap(), 2);

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        // Both earlier entries should have aged out of the window by now.
        assert_eq!(storage.record_and_count("k", window, 2).await.unwrap(), 1);
    }
}
