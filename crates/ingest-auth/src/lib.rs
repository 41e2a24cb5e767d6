#![forbid(unsafe_code)]

//! **ingest-auth** – Credential Validator (§4.A).
//!
//! Wraps the external auth boundary (§6, out of scope) behind a TTL cache that
//! is concurrency-safe under many readers and occasional writers, with
//! opportunistic cleanup of expired entries. Both positive and negative results
//! are cached. A caller that has no validator configured gets a distinct
//! [`AuthError::NotConfigured`] rather than a silent success.

mod cache;
mod error;
mod validator;

pub use cache::TokenCache;
pub use error::AuthError;
pub use validator::{CredentialValidator, HttpCredentialValidator};

use ingest_types::TokenCacheEntry;

/// Validate `token` against `validator`, reporting [`AuthError::NotConfigured`]
/// when no validator is present instead of treating absence as success.
pub async fn validate(
    validator: Option<&dyn CredentialValidator>,
    token: &str,
) -> Result<TokenCacheEntry, AuthError> {
    match validator {
        Some(v) => v.validate(token).await,
        None => Err(AuthError::NotConfigured),
    }
}
