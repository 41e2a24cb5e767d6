//! Error type shared by the queue and the subscriber client.

use thiserror::Error;

/// Errors surfaced by [`crate::EventQueue`] and [`crate::SubscriberClient`].
#[derive(Error, Debug)]
pub enum BusError {
    /// The queue is at capacity; the caller should reject the request (§4.E,
    /// surfaced upward as `Reason::QueueFull`).
    #[error("queue is full")]
    QueueFull,
    /// The queue (or broker) has been shut down and no longer accepts work.
    #[error("queue is closed")]
    Closed,
    /// An unknown subscription id was passed to `unsubscribe`.
    #[error("unknown subscription")]
    UnknownSubscription,
    /// The durable stream backing a [`crate::DurableSubscriberClient`] failed.
    #[error("durable stream error: {0}")]
    Store(#[from] ingest_store::StoreError),
}
