//! Rate limit keyspaces (§4.B: `ip:<addr>` pre-auth, `token:<id>` post-auth).

use std::net::IpAddr;

/// Identifier for the subject being rate limited.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RateLimitKey {
    /// Pre-auth keyspace, keyed by source IP.
    Ip(IpAddr),
    /// Post-auth keyspace, keyed by the validated token's opaque id.
    Token(String),
}

impl RateLimitKey {
    /// The string key used by [`crate::RateLimitStorage`] backends.
    pub fn to_storage_key(&self) -> String {
        match self {
            RateLimitKey::Ip(ip) => format!("ip:{ip}"),
            RateLimitKey::Token(id) => format!("token:{id}"),
        }
    }
}

impl std::fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_storage_key())
    }
}
