//! The Subscriber Client (§4.O): a small broker abstraction with two
//! interchangeable flavors — in-process broadcast and durable-stream-backed.
//!
//! Grounded on the teacher's `toka-bus-core::InMemoryBus`, but redesigned per
//! the design note on cyclic references: a subscription is an independent
//! record keyed by its id in a map owned by the broker, not a handle that
//! points back into the client and vice versa. `unsubscribe` just removes
//! the record; nothing needs to be torn down on the client side beyond
//! forgetting the id.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use ingest_store::DurableStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::BusError;

/// Opaque handle to a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Publish/subscribe boundary used by the search, response, and ingestion
/// components to exchange jobs, results, and DLQ notifications.
#[async_trait]
pub trait SubscriberClient: Send + Sync {
    /// Publish `payload` to `subject`.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Subscribe to `subject`, optionally as a member of `queue_group`. When
    /// a queue group is given, only one member of the group receives each
    /// message; without one, every subscriber on the subject receives every
    /// message.
    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<(SubscriptionId, mpsc::Receiver<Vec<u8>>), BusError>;

    /// Remove a subscription. Unknown ids are reported as
    /// [`BusError::UnknownSubscription`] rather than ignored, since a caller
    /// unsubscribing twice usually indicates a bug worth surfacing.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError>;
}

struct Subscription {
    subject: String,
    queue_group: Option<String>,
    sender: mpsc::Sender<Vec<u8>>,
}

/// In-process broker. Delivery is fire-and-forget: a subscriber that isn't
/// currently receiving (channel full) simply misses the message, matching
/// the teacher's broadcast bus semantics.
#[derive(Default)]
pub struct InMemoryBroker {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    by_subject: DashMap<String, DashSet<SubscriptionId>>,
    /// Round-robin cursor per (subject, queue_group), so queue-group members
    /// take turns rather than always favoring the first one registered.
    cursors: DashMap<(String, String), usize>,
}

impl InMemoryBroker {
    /// An empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    fn subject_members(&self, subject: &str) -> Vec<SubscriptionId> {
        self.by_subject.get(subject).map(|set| set.iter().map(|id| *id).collect()).unwrap_or_default()
    }
}

#[async_trait]
impl SubscriberClient for InMemoryBroker {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let members = self.subject_members(subject);

        let mut grouped: std::collections::HashMap<String, Vec<SubscriptionId>> =
            std::collections::HashMap::new();
        let mut ungrouped = Vec::new();
        for id in members {
            if let Some(sub) = self.subscriptions.get(&id) {
                match &sub.queue_group {
                    Some(group) => grouped.entry(group.clone()).or_default().push(id),
                    None => ungrouped.push(id),
                }
            }
        }

        for id in ungrouped {
            if let Some(sub) = self.subscriptions.get(&id) {
                let _ = sub.sender.try_send(payload.clone());
            }
        }

        for (group, members) in grouped {
            if members.is_empty() {
                continue;
            }
            let key = (subject.to_string(), group);
            let mut cursor = self.cursors.entry(key).or_insert(0);
            let pick = members[*cursor % members.len()];
            *cursor = cursor.wrapping_add(1);
            if let Some(sub) = self.subscriptions.get(&pick) {
                let _ = sub.sender.try_send(payload.clone());
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<(SubscriptionId, mpsc::Receiver<Vec<u8>>), BusError> {
        let (sender, receiver) = mpsc::channel(256);
        let id = SubscriptionId::new();
        self.subscriptions.insert(
            id,
            Subscription {
                subject: subject.to_string(),
                queue_group: queue_group.map(str::to_string),
                sender,
            },
        );
        self.by_subject.entry(subject.to_string()).or_default().insert(id);
        Ok((id, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let (_, sub) = self.subscriptions.remove(&id).ok_or(BusError::UnknownSubscription)?;
        if let Some(set) = self.by_subject.get(&sub.subject) {
            set.remove(&id);
        }
        Ok(())
    }
}

/// Durable-stream-backed flavor (§4.J shares the same primitive for the DLQ
/// stream backend). Subscription delivery is poll-based: sled has no native
/// wakeup on write, so each subscription owns a background task that polls
/// for new sequence numbers. This is adequate for the ingestion data plane's
/// internal fan-out, not a low-latency pub/sub substitute.
pub struct DurableSubscriberClient {
    stream: Arc<DurableStream>,
    poll_interval: std::time::Duration,
    tasks: DashMap<SubscriptionId, JoinHandle<()>>,
}

impl DurableSubscriberClient {
    /// Build a client over an existing durable stream, polling for new
    /// messages every `poll_interval`.
    pub fn new(stream: Arc<DurableStream>, poll_interval: std::time::Duration) -> Self {
        Self { stream, poll_interval, tasks: DashMap::new() }
    }
}

#[async_trait]
impl SubscriberClient for DurableSubscriberClient {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.stream.publish(subject, &payload)?;
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        _queue_group: Option<&str>,
    ) -> Result<(SubscriptionId, mpsc::Receiver<Vec<u8>>), BusError> {
        let (sender, receiver) = mpsc::channel(256);
        let id = SubscriptionId::new();
        let stream = Arc::clone(&self.stream);
        let subject = subject.to_string();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut last_sequence = None;
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                let messages = match stream.read_from_start(&subject, usize::MAX) {
                    Ok(messages) => messages,
                    Err(err) => {
                        tracing::warn!(%subject, error = %err, "durable subscriber poll failed");
                        continue;
                    }
                };
                for message in messages {
                    if last_sequence.map(|seen| message.sequence > seen).unwrap_or(true) {
                        last_sequence = Some(message.sequence);
                        if sender.send(message.payload).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        self.tasks.insert(id, handle);
        Ok((id, receiver))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), BusError> {
        let (_, handle) = self.tasks.remove(&id).ok_or(BusError::UnknownSubscription)?;
        handle.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let broker = InMemoryBroker::new();
        let (_, mut rx) = broker.subscribe("respond.alerts.created", None).await.unwrap();
        broker.publish("respond.alerts.created", b"alert".to_vec()).await.unwrap();
        assert_eq!(rx.recv().await, Some(b"alert".to_vec()));
    }

    #[tokio::test]
    async fn queue_group_delivers_to_exactly_one_member() {
        let broker = InMemoryBroker::new();
        let (_, mut a) = broker.subscribe("search.jobs.query", Some("search-workers")).await.unwrap();
        let (_, mut b) = broker.subscribe("search.jobs.query", Some("search-workers")).await.unwrap();
        broker.publish("search.jobs.query", b"job".to_vec()).await.unwrap();

        let got_a = a.try_recv().is_ok();
        let got_b = b.try_recv().is_ok();
        assert_ne!(got_a, got_b, "exactly one queue-group member should receive the message");
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let broker = InMemoryBroker::new();
        let (id, mut rx) = broker.subscribe("respond.cases.created", None).await.unwrap();
        broker.unsubscribe(id).await.unwrap();
        broker.publish("respond.cases.created", b"case".to_vec()).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_errors() {
        let broker = InMemoryBroker::new();
        let bogus = SubscriptionId::new();
        assert!(matches!(broker.unsubscribe(bogus).await, Err(BusError::UnknownSubscription)));
    }
}
