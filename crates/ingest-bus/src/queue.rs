//! The bounded Event Queue (§4.E).
//!
//! "A bounded FIFO of capacity C (default 10000). Enqueue is non-blocking:
//! if full, fail immediately... On shutdown, the queue is drained with a
//! deadline; residual events are dropped and their acks failed."
//!
//! Built on [`tokio::sync::mpsc`]'s bounded channel, the way the teacher
//! wraps channels for its agent-runtime task queues: a `try_send` gives the
//! non-blocking enqueue directly, and a depth counter makes `queue_depth`
//! (§4.L) observable without reaching into the channel's internals.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

use crate::error::BusError;

/// A bounded, multi-producer, multi-consumer event queue.
///
/// Consumers share one receiver behind a mutex: at most one worker is ever
/// polling for the next event, which is sufficient for the worker-pool
/// pattern described in §4.H (each worker pulls one event, processes it
/// fully, then pulls the next).
pub struct EventQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    depth: Arc<AtomicUsize>,
    capacity: usize,
    closed: AtomicBool,
}

impl<T: Send + 'static> EventQueue<T> {
    /// Create a queue with the given capacity (default 10000 per §4.E).
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx: Mutex::new(rx), depth: Arc::new(AtomicUsize::new(0)), capacity, closed: AtomicBool::new(false) }
    }

    /// Configured capacity, for the `queue_capacity` metric.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current depth, for the `queue_depth` metric.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Enqueue without blocking. Fails immediately with
    /// [`BusError::QueueFull`] instead of waiting for room.
    pub fn try_enqueue(&self, item: T) -> Result<(), BusError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(BusError::Closed);
        }
        match self.tx.try_send(item) {
            Ok(()) => {
                self.depth.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(BusError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(BusError::Closed),
        }
    }

    /// Wait for the next event. Returns `None` once the queue is closed and
    /// drained.
    pub async fn dequeue(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        let item = rx.recv().await;
        if item.is_some() {
            self.depth.fetch_sub(1, Ordering::Relaxed);
        }
        item
    }

    /// Stop accepting new events and drain whatever remains, up to
    /// `deadline`. Items still queued after the deadline are returned
    /// undrained so the caller can fail their acks (the queue itself holds
    /// no ack bookkeeping).
    ///
    /// Closes the receiver as well as the `closed` flag: `recv()` only ever
    /// returns `None` once every sender is dropped, and `tx` lives as long as
    /// `self`, so without this, `dequeue()` would block forever waiting on an
    /// empty-but-open channel and worker loops would never see shutdown.
    pub async fn drain(&self, deadline: Duration) -> Vec<T> {
        self.closed.store(true, Ordering::Relaxed);
        self.rx.lock().await.close();
        let deadline_at = tokio::time::Instant::now() + deadline;
        let mut leftover = Vec::new();
        loop {
            let remaining = match tokio::time::Instant::now().checked_duration_since(deadline_at) {
                Some(_) => break,
                None => deadline_at - tokio::time::Instant::now(),
            };
            let mut rx = self.rx.lock().await;
            match timeout(remaining, rx.recv()).await {
                Ok(Some(item)) => {
                    self.depth.fetch_sub(1, Ordering::Relaxed);
                    leftover.push(item);
                }
                Ok(None) => break,
                Err(_) => break,
            }
        }
        leftover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_dequeue_roundtrip() {
        let queue: EventQueue<u32> = EventQueue::new(4);
        queue.try_enqueue(1).unwrap();
        queue.try_enqueue(2).unwrap();
        assert_eq!(queue.depth(), 2);
        assert_eq!(queue.dequeue().await, Some(1));
        assert_eq!(queue.dequeue().await, Some(2));
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn full_queue_rejects_without_blocking() {
        let queue: EventQueue<u32> = EventQueue::new(1);
        queue.try_enqueue(1).unwrap();
        match queue.try_enqueue(2) {
            Err(BusError::QueueFull) => {}
            other => panic!("expected QueueFull, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn drain_drops_residual_after_deadline() {
        let queue: EventQueue<u32> = EventQueue::new(4);
        queue.try_enqueue(1).unwrap();
        queue.try_enqueue(2).unwrap();
        let residual = queue.drain(Duration::from_millis(10)).await;
        assert_eq!(residual, vec![1, 2]);
    }

    #[tokio::test]
    async fn drain_closes_the_queue_to_new_enqueues() {
        let queue: EventQueue<u32> = EventQueue::new(4);
        queue.drain(Duration::from_millis(10)).await;
        match queue.try_enqueue(1) {
            Err(BusError::Closed) => {}
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dequeue_unblocks_after_drain_instead_of_hanging() {
        let queue: Arc<EventQueue<u32>> = Arc::new(EventQueue::new(4));
        let worker = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue().await })
        };
        // Give the worker a chance to start waiting on an empty channel.
        tokio::task::yield_now().await;
        queue.drain(Duration::from_millis(50)).await;

        let result = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker loop hung after drain instead of observing channel closure");
        assert_eq!(result.unwrap(), None);
    }
}
