//! TTL cache of token validation results, shared by many readers (§4.A, P4).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use ingest_types::TokenCacheEntry;

/// Concurrency-safe cache of `token -> TokenCacheEntry`.
///
/// Readers never see an entry past its expiry (§3 I6) — [`TokenCache::get`]
/// checks liveness itself rather than trusting the caller. Cleanup of expired
/// entries is opportunistic: it piggybacks on writes rather than running its
/// own background task, since a busy cache is continuously writing anyway.
#[derive(Debug)]
pub struct TokenCache {
    entries: RwLock<HashMap<String, TokenCacheEntry>>,
    ttl: Duration,
}

impl TokenCache {
    /// Build a cache with the given default TTL for freshly inserted entries.
    pub fn new(ttl: Duration) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl }
    }

    /// Default 5 minute TTL per §4.A.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::minutes(5))
    }

    /// Return a live entry for `token`, or `None` if absent or expired.
    pub async fn get(&self, token: &str) -> Option<TokenCacheEntry> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        entries.get(token).filter(|e| e.is_live(now)).cloned()
    }

    /// Insert or replace the entry for `token`, stamping `expires_at` from the
    /// cache's configured TTL, and opportunistically sweep expired entries.
    pub async fn put(&self, token: &str, mut entry: TokenCacheEntry) {
        let now = Utc::now();
        entry.expires_at = now + self.ttl;

        let mut entries = self.entries.write().await;
        entries.insert(token.to_string(), entry);
        entries.retain(|_, e| e.is_live(now));
    }

    /// Number of entries currently held, live or not (diagnostic only).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(valid: bool, expires_at: DateTime<Utc>) -> TokenCacheEntry {
        TokenCacheEntry {
            valid,
            tenant_id: "tenant-a".to_string(),
            token_id: "tok-1".to_string(),
            user_id: None,
            expires_at,
        }
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let cache = TokenCache::new(Duration::milliseconds(10));
        cache.put("t", entry(true, Utc::now())).await;
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(cache.get("t").await.is_none());
    }

    #[tokio::test]
    async fn negative_results_are_cached_too() {
        let cache = TokenCache::new(Duration::minutes(1));
        cache.put("bad", entry(false, Utc::now())).await;
        let cached = cache.get("bad").await.expect("present");
        assert!(!cached.valid);
    }
}
