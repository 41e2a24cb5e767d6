//! Credential validator error type.

use thiserror::Error;

/// Errors from validating a bearer token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No validator was wired up for this call site (§4.A: "a nil receiver is
    /// reported as `not configured`, not as success").
    #[error("credential validator not configured")]
    NotConfigured,
    /// The token was well-formed but rejected by the auth boundary.
    #[error("invalid token")]
    Invalid,
    /// The external auth boundary could not be reached or timed out.
    #[error("auth boundary unavailable: {0}")]
    Unavailable(String),
}
