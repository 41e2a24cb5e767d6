#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-ack** – The Ack Manager (§4.D).

mod manager;

pub use manager::{AckManager, CLEANUP_INTERVAL, DEFAULT_TTL};
