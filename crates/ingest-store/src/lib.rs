#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-store** – A durable, subject-partitioned append-only stream.
//!
//! Two callers in this workspace need "multi-process durable pub/sub with an
//! ephemeral replay consumer" as a primitive: the DLQ's stream backend (§4.J,
//! subject per reason) and the durable flavor of the Subscriber Client (§4.O).
//! Rather than duplicate that plumbing, both are built on this one sled-backed
//! log, generalized from a single event stream (as the teacher's storage
//! drivers provide) to one tree per subject with a monotonic sequence number
//! per message.

mod error;
mod stream;

pub use error::StoreError;
pub use stream::{DurableStream, Message, StreamStats};
