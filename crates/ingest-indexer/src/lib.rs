#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-indexer** – The Bulk Indexer (§4.I) and Index Lifecycle (§4.K).

mod batcher;
mod error;
mod indexer;
mod lifecycle;
mod retry;

pub use batcher::Batcher;
pub use error::IndexerError;
pub use indexer::{BulkIndexResult, BulkIndexer, DocumentOutcome};
pub use lifecycle::{IndexLifecycle, RetentionConfig};
pub use retry::{backoff_delay, retry_with_backoff, BASE_DELAY, MAX_RETRIES};
