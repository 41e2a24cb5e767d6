//! The `CredentialValidator` trait and its HTTP-backed implementation.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use ingest_types::TokenCacheEntry;

use crate::cache::TokenCache;
use crate::error::AuthError;

/// Given a bearer token string, return `{valid, tenant_id, token_id, user_id}`
/// or an error (§4.A contract).
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Validate `token`, consulting the cache first and falling back to the
    /// external auth boundary on a miss.
    async fn validate(&self, token: &str) -> Result<TokenCacheEntry, AuthError>;
}

#[derive(Debug, Deserialize)]
struct AuthBoundaryResponse {
    valid: bool,
    #[serde(default)]
    tenant_id: String,
    #[serde(default)]
    token_id: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// Validates tokens against an HTTP auth boundary, caching both outcomes.
pub struct HttpCredentialValidator {
    client: reqwest::Client,
    base_url: String,
    cache: TokenCache,
    deadline: StdDuration,
}

impl HttpCredentialValidator {
    /// Build a validator calling `base_url` with the given per-call deadline
    /// (§5: credential validation deadline is 2s) and cache TTL.
    pub fn new(base_url: impl Into<String>, deadline: StdDuration, cache: TokenCache) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache,
            deadline,
        }
    }

    async fn call_boundary(&self, token: &str) -> Result<TokenCacheEntry, AuthError> {
        let url = format!("{}/validate", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.deadline)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            // The auth boundary itself distinguishes "unreachable" from "token
            // rejected"; a non-2xx that still parses as the response body is
            // treated as an authoritative negative result below.
            warn!(status = %resp.status(), "auth boundary returned non-success status");
        }

        let body: AuthBoundaryResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        Ok(TokenCacheEntry {
            valid: body.valid,
            tenant_id: body.tenant_id,
            token_id: body.token_id,
            user_id: body.user_id,
            expires_at: Utc::now(), // overwritten by TokenCache::put
        })
    }
}

#[async_trait]
impl CredentialValidator for HttpCredentialValidator {
    async fn validate(&self, token: &str) -> Result<TokenCacheEntry, AuthError> {
        if let Some(cached) = self.cache.get(token).await {
            debug!(token_id = %cached.token_id, "credential cache hit");
            return if cached.valid { Ok(cached) } else { Err(AuthError::Invalid) };
        }

        let result = self.call_boundary(token).await?;
        self.cache.put(token, result.clone()).await;

        if result.valid {
            Ok(result)
        } else {
            Err(AuthError::Invalid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn cache_hit_skips_network() {
        // A validator pointed at an unroutable address would fail any real
        // network call; a pre-warmed cache entry must still resolve.
        let validator = HttpCredentialValidator::new(
            "http://127.0.0.1:1",
            StdDuration::from_millis(50),
            TokenCache::new(ChronoDuration::minutes(5)),
        );
        validator
            .cache
            .put(
                "tok",
                TokenCacheEntry {
                    valid: true,
                    tenant_id: "tenant-a".to_string(),
                    token_id: "tok-id".to_string(),
                    user_id: None,
                    expires_at: Utc::now(),
                },
            )
            .await;

        let result = validator.validate("tok").await.expect("cached hit");
        assert_eq!(result.tenant_id, "tenant-a");
    }
}
