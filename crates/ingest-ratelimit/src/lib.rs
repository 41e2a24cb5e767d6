#![forbid(unsafe_code)]

//! **ingest-ratelimit** – Sliding-window admission control for the HEC endpoint (§4.B).
//!
//! Two independent keyspaces are used by callers: `RateLimitKey::Ip` (pre-auth)
//! and `RateLimitKey::Token` (post-auth). Evaluation is atomic with respect to
//! concurrent callers sharing the same [`RateLimitStorage`]; on backend error
//! the limiter surfaces the error so callers can fail open per §7.

mod error;
mod key;
mod storage;

pub use error::RateLimitError;
pub use key::RateLimitKey;
pub use storage::{MemoryRateLimitStorage, RateLimitStorage};

use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The request must be rejected; HEC callers translate this to 429 code 9.
    Deny,
}

impl Decision {
    /// True for `Allow`.
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Sliding-window admission control, `allow(key) -> {allowed, err}` (§4.B contract).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Evaluate one request against `key`'s sliding window.
    async fn allow(&self, key: &RateLimitKey) -> Result<Decision, RateLimitError>;
}

/// The configured sliding-window limiter: prune entries older than `now-window`,
/// count, accept-and-record if `count < limit`, else deny (§3 I7).
pub struct SlidingWindowLimiter<S: RateLimitStorage> {
    storage: S,
    limit: u32,
    window: Duration,
}

impl<S: RateLimitStorage> SlidingWindowLimiter<S> {
    /// Build a limiter enforcing at most `limit` admissions per `window`.
    pub fn new(storage: S, limit: u32, window: Duration) -> Self {
        Self { storage, limit, window }
    }
}

#[async_trait]
impl<S: RateLimitStorage> RateLimiter for SlidingWindowLimiter<S> {
    async fn allow(&self, key: &RateLimitKey) -> Result<Decision, RateLimitError> {
        let count = self
            .storage
            .record_and_count(&key.to_storage_key(), self.window, self.limit)
            .await?;
        if count <= self.limit {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny)
        }
    }
}

/// Always-allow limiter, selected when rate limiting is disabled or the backend
/// is unavailable (§4.B: "a no-op implementation is always-allow").
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAllowLimiter;

#[async_trait]
impl RateLimiter for AlwaysAllowLimiter {
    async fn allow(&self, _key: &RateLimitKey) -> Result<Decision, RateLimitError> {
        Ok(Decision::Allow)
    }
}

/// Evaluate `limiter` and fail open on backend error (§7: "rate-limiter backend
/// errors fail open"). Logs a warning and admits the request.
pub async fn allow_or_fail_open<L: RateLimiter + ?Sized>(limiter: &L, key: &RateLimitKey) -> Decision {
    match limiter.allow(key).await {
        Ok(decision) => decision,
        Err(err) => {
            warn!(error = %err, key = %key.to_storage_key(), "rate limiter backend error, failing open");
            Decision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn sliding_window_denies_past_limit() {
        let limiter = SlidingWindowLimiter::new(MemoryRateLimitStorage::new(), 3, Duration::seconds(1));
        let key = RateLimitKey::Ip(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));

        for _ in 0..3 {
            assert_eq!(limiter.allow(&key).await.unwrap(), Decision::Allow);
        }
        assert_eq!(limiter.allow(&key).await.unwrap(), Decision::Deny);
    }

    #[tokio::test]
    async fn independent_keyspaces_do_not_interfere() {
        let limiter = SlidingWindowLimiter::new(MemoryRateLimitStorage::new(), 1, Duration::seconds(1));
        let ip_key = RateLimitKey::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let token_key = RateLimitKey::Token("tok-1".to_string());

        assert!(limiter.allow(&ip_key).await.unwrap().is_allowed());
        assert!(limiter.allow(&token_key).await.unwrap().is_allowed());
        assert!(!limiter.allow(&ip_key).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn always_allow_never_denies() {
        let limiter = AlwaysAllowLimiter;
        let key = RateLimitKey::Token("whatever".to_string());
        for _ in 0..1000 {
            assert!(limiter.allow(&key).await.unwrap().is_allowed());
        }
    }
}
