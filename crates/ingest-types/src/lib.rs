#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-types** – Shared value types for the Telhawk ingestion data plane.
//!
//! This crate defines the raw envelope and canonical OCSF event shapes that flow
//! through every other crate in the workspace, plus the small supporting records
//! (ack, DLQ, token cache) and the stable error-reason taxonomy used for metrics
//! labels and DLQ records. It has no logic of its own, matching the teacher's
//! leaf-level types crate: everything here is data, not behavior.

pub mod ack;
pub mod canonical;
pub mod dlq;
pub mod envelope;
pub mod hec;
pub mod reason;
pub mod token;

pub use ack::{AckId, AckRecord, AckStatus};
pub use canonical::CanonicalEvent;
pub use dlq::DlqRecord;
pub use envelope::RawEnvelope;
pub use reason::Reason;
pub use token::TokenCacheEntry;
