//! Unbounded blocking FIFO queue for inter-thread hand-off.
//!
//! A mutex-and-condvar queue where producers never block and consumers
//! suspend until an item arrives.
//!
//! # Overview
//!
//! - [`BlockingQueue::put`] - Non-blocking enqueue; wakes one waiter
//! - [`BlockingQueue::take`] - Blocking dequeue in FIFO order
//! - Unbounded: `put` always succeeds, there is no backpressure
//!
//! FIFO ordering is the load-bearing guarantee here: a consumer observes
//! every value in the order it was produced, so no transition is skipped
//! or reordered as long as consumption keeps pace.
//!
//! # Example
//!
//! ```
//! use stoplight::sync::queue::BlockingQueue;
//!
//! let queue = BlockingQueue::new();
//!
//! queue.put(42u64);
//!
//! // Blocks if the queue is empty.
//! assert_eq!(queue.take(), 42);
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};

/// Unbounded FIFO queue with a blocking consumer side.
///
/// The internal sequence is only ever mutated while the lock is held, and
/// the emptiness condition is re-checked after every condvar wakeup, so
/// spurious wakeups and waiters racing for the same notification never
/// produce a phantom value.
///
/// # Thread Safety
///
/// All operations take `&self`; share the queue across threads via `Arc`.
/// Any number of producers and consumers may operate concurrently.
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Creates a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Appends `item` to the back of the queue and wakes one blocked waiter.
    ///
    /// Ownership of `item` transfers into the queue. Never blocks.
    pub fn put(&self, item: T) {
        let mut items = self.lock();
        items.push_back(item);
        drop(items);
        self.available.notify_one();
    }

    /// Removes and returns the front (oldest) element, blocking until one
    /// is available.
    ///
    /// Blocks indefinitely; there is no timeout variant.
    pub fn take(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self
                .available
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the front element without blocking.
    ///
    /// Returns `None` if the queue is empty.
    #[must_use]
    pub fn try_take(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Returns the number of queued items at the time of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the queue held no items at the time of the call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Acquires the item lock, continuing through poison.
    ///
    /// A poisoned lock means a thread panicked while holding it; the
    /// sequence itself is still structurally sound, so waiters keep going
    /// rather than deadlocking the process.
    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = BlockingQueue::new();

        for i in 0..10u64 {
            queue.put(i);
        }

        for i in 0..10u64 {
            assert_eq!(queue.take(), i);
        }

        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_take_empty() {
        let queue: BlockingQueue<u64> = BlockingQueue::new();

        assert_eq!(queue.try_take(), None);

        queue.put(7);
        assert_eq!(queue.try_take(), Some(7));
        assert_eq!(queue.try_take(), None);
    }

    #[test]
    fn test_len_tracks_contents() {
        let queue = BlockingQueue::new();

        assert_eq!(queue.len(), 0);
        queue.put(1u64);
        queue.put(2u64);
        assert_eq!(queue.len(), 2);

        let _ = queue.take();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_non_copy_type() {
        let queue = BlockingQueue::new();

        queue.put("hello".to_string());
        queue.put("world".to_string());

        assert_eq!(queue.take(), "hello".to_string());
        assert_eq!(queue.take(), "world".to_string());
    }

    #[test]
    fn test_take_blocks_until_put() {
        let queue = Arc::new(BlockingQueue::new());
        let (done_tx, done_rx) = mpsc::channel();

        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            let value = consumer_queue.take();
            done_tx.send(value).unwrap();
        });

        // The consumer must still be blocked: nothing has been put yet.
        assert_eq!(
            done_rx.recv_timeout(Duration::from_millis(100)),
            Err(mpsc::RecvTimeoutError::Timeout)
        );

        queue.put(99u64);

        // And must return the put value promptly afterward.
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(99));
        consumer.join().unwrap();
    }

    #[test]
    fn test_no_loss_single_producer_single_consumer() {
        let queue = Arc::new(BlockingQueue::new());
        let count = 1000u64;

        let producer_queue = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            for i in 0..count {
                producer_queue.put(i);
            }
        });

        let consumer_queue = Arc::clone(&queue);
        let consumer = thread::spawn(move || {
            let mut received = Vec::with_capacity(count as usize);
            for _ in 0..count {
                received.push(consumer_queue.take());
            }
            received
        });

        producer.join().unwrap();
        let received = consumer.join().unwrap();

        // Every put has exactly one matching take, in FIFO order.
        assert_eq!(received.len(), count as usize);
        for (i, &value) in received.iter().enumerate() {
            assert_eq!(value, i as u64);
        }
    }

    #[test]
    fn test_each_waiter_gets_one_value() {
        let queue: Arc<BlockingQueue<u64>> = Arc::new(BlockingQueue::new());
        let num_waiters = 4;

        let mut handles = vec![];
        for _ in 0..num_waiters {
            let waiter_queue = Arc::clone(&queue);
            handles.push(thread::spawn(move || waiter_queue.take()));
        }

        for i in 0..num_waiters {
            queue.put(i as u64);
        }

        let mut values: Vec<u64> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        values.sort_unstable();

        // No value is dropped or delivered twice across waiters.
        assert_eq!(values, vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }
}
