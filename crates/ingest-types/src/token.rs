//! Token cache entry shape used by the Credential Validator (§4.A).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached result of validating a bearer token against the external auth boundary.
///
/// Both positive and negative results are cached (§4.A); `valid` distinguishes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCacheEntry {
    /// Whether the token was accepted by the auth boundary.
    pub valid: bool,
    /// Tenant the token resolves to. Empty when `valid` is false.
    pub tenant_id: String,
    /// Opaque token identifier (not the raw token string).
    pub token_id: String,
    /// User the token belongs to, if the auth boundary reports one.
    pub user_id: Option<String>,
    /// UTC instant after which this entry must not be returned (§3 I6, P4).
    pub expires_at: DateTime<Utc>,
}

impl TokenCacheEntry {
    /// Whether this entry is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}
