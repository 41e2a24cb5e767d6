#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-dlq** – Two interchangeable dead-letter backends behind one
//! writer contract (§4.J), plus a disabled/nil backend.

mod error;
mod file;
mod noop;
mod stream;
mod writer;

pub use error::DlqError;
pub use file::FileDlqBackend;
pub use noop::NoopDlqBackend;
pub use stream::StreamDlqBackend;
pub use writer::{DlqStats, DlqWriter};
