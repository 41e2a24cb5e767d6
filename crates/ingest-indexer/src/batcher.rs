//! Size/time flush trigger (§4.I: "flushes by batch size ... or time ...,
//! whichever first"). The batcher only tracks accumulation; the caller
//! drives the time side with its own `tokio::time::interval` and calls
//! [`Batcher::take`] on each tick.

use tokio::sync::Mutex;

/// Accumulates events until a size threshold is reached or the caller
/// forces a flush.
pub struct Batcher<T> {
    buffer: Mutex<Vec<T>>,
    batch_size: usize,
}

impl<T> Batcher<T> {
    /// Default batch size (§4.I: 100).
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    /// A batcher that flushes once `batch_size` items have accumulated.
    pub fn new(batch_size: usize) -> Self {
        Self { buffer: Mutex::new(Vec::with_capacity(batch_size)), batch_size }
    }

    /// Push one item. Returns `Some(batch)` if this push reached the size
    /// threshold; the caller should submit that batch immediately.
    pub async fn push(&self, item: T) -> Option<Vec<T>> {
        let mut buffer = self.buffer.lock().await;
        buffer.push(item);
        if buffer.len() >= self.batch_size {
            Some(std::mem::take(&mut *buffer))
        } else {
            None
        }
    }

    /// Drain whatever has accumulated, regardless of size. Called on the
    /// time-based flush tick.
    pub async fn take(&self) -> Vec<T> {
        let mut buffer = self.buffer.lock().await;
        std::mem::take(&mut *buffer)
    }
}

impl<T> Default for Batcher<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flushes_once_size_threshold_reached() {
        let batcher = Batcher::new(2);
        assert!(batcher.push(1).await.is_none());
        assert_eq!(batcher.push(2).await, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn take_drains_partial_batch() {
        let batcher: Batcher<u32> = Batcher::new(10);
        batcher.push(1).await;
        batcher.push(2).await;
        assert_eq!(batcher.take().await, vec![1, 2]);
        assert_eq!(batcher.take().await, Vec::<u32>::new());
    }
}
