#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **ingest-bus** – The bounded Event Queue (§4.E), the Subject Catalog (§4.M),
//! and the Subscriber Client (§4.O).

mod error;
mod queue;
mod subject_catalog;
mod subscriber;

pub use error::BusError;
pub use queue::EventQueue;
pub use subject_catalog::{queue_groups, subjects};
pub use subscriber::{DurableSubscriberClient, InMemoryBroker, SubscriberClient, SubscriptionId};
