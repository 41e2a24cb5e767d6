//! Error type for the durable stream primitive.

use thiserror::Error;

/// Errors from the durable stream backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying sled database failed.
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),
    /// A stored message failed to deserialize.
    #[error("corrupt message: {0}")]
    Corrupt(String),
}
