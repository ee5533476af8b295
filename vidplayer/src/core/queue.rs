/*!
    Bounded FIFO queue shared by the packet and frame stages.

    The teacher's `PacketQueue` and `FrameQueue` were two copies of the same
    mutex+condvar queue differing only in the element type. This generic
    version replaces both; `PacketQueue` and `FrameQueue` below are type
    aliases over it.
*/

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::packet::Packet;
use super::frame::Frame;

/// Result of a non-blocking or timed-out dequeue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    /// The queue is empty but not finished; caller should retry later.
    Empty,
    /// The queue is empty and finished; no more items will ever arrive.
    Closed,
}

struct Inner<T> {
    items: VecDeque<T>,
    capacity: usize,
    finished: bool,
}

/// A bounded, mutex+condvar backed FIFO. See spec §4.1 for the full contract.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                capacity,
                finished: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks while the queue is full and not finished. Returns `Err` with
    /// the item handed back if the queue was (or became) finished.
    pub fn enqueue(&self, item: T) -> Result<(), T> {
        let mut inner = self.inner.lock();
        while inner.items.len() >= inner.capacity && !inner.finished {
            self.not_full.wait(&mut inner);
        }

        if inner.finished {
            return Err(item);
        }

        inner.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Blocks while the queue is empty and not finished, up to `timeout`.
    pub fn dequeue(&self, timeout: Duration) -> Result<T, DequeueError> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();

        while inner.items.is_empty() && !inner.finished {
            let now = Instant::now();
            if now >= deadline {
                return Err(DequeueError::Empty);
            }
            let remaining = deadline - now;
            let timed_out = self.not_empty.wait_for(&mut inner, remaining).timed_out();
            if timed_out && inner.items.is_empty() && !inner.finished {
                return Err(DequeueError::Empty);
            }
        }

        match inner.items.pop_front() {
            Some(item) => {
                self.not_full.notify_one();
                Ok(item)
            }
            None => Err(DequeueError::Closed),
        }
    }

    /// Non-blocking variant of `dequeue`.
    pub fn try_dequeue(&self) -> Result<T, DequeueError> {
        let mut inner = self.inner.lock();
        match inner.items.pop_front() {
            Some(item) => {
                self.not_full.notify_one();
                Ok(item)
            }
            None if inner.finished => Err(DequeueError::Closed),
            None => Err(DequeueError::Empty),
        }
    }

    /// Atomically removes and drops every queued item. Does not change
    /// `finished`.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        self.not_full.notify_all();
    }

    /// Sets the finished flag and wakes every waiter.
    pub fn set_finished(&self) {
        let mut inner = self.inner.lock();
        inner.finished = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Clears the queue and resets `finished` to false, so a stopped queue
    /// can be reused after a seek without allocating a fresh one.
    pub fn reopen(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        inner.finished = false;
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock();
        inner.items.len() >= inner.capacity
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().finished
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

pub type PacketQueue = BoundedQueue<Packet>;
pub type FrameQueue = BoundedQueue<Frame>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_preserved() {
        // Given a queue with room for everything we push
        // When we enqueue 1..=5 without an intervening clear
        // Then dequeue returns them in the same order
        let q: BoundedQueue<i32> = BoundedQueue::new(8);
        for i in 1..=5 {
            q.enqueue(i).unwrap();
        }
        let mut seen = Vec::new();
        while let Ok(v) = q.try_dequeue() {
            seen.push(v);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let q: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::new(2));
        assert!(q.enqueue(1).is_ok());
        assert!(q.enqueue(2).is_ok());
        assert!(q.is_full());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drains_then_closes_without_blocking() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        q.set_finished();

        assert_eq!(q.dequeue(Duration::from_millis(10)), Ok(1));
        assert_eq!(q.dequeue(Duration::from_millis(10)), Ok(2));
        assert_eq!(
            q.dequeue(Duration::from_millis(10)),
            Err(DequeueError::Closed)
        );
    }

    #[test]
    fn clear_releases_every_item_and_keeps_finished_flag() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        q.enqueue(1).unwrap();
        q.enqueue(2).unwrap();
        q.clear();
        assert!(q.is_empty());
        assert!(!q.is_finished());
    }

    #[test]
    fn enqueue_on_finished_queue_fails_and_returns_item() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        q.set_finished();
        match q.enqueue(42) {
            Err(item) => assert_eq!(item, 42),
            Ok(()) => panic!("expected enqueue to fail on a finished queue"),
        }
    }

    #[test]
    fn blocked_producer_wakes_on_consumer_dequeue() {
        let q: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::new(1));
        q.enqueue(1).unwrap();

        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || {
            q2.enqueue(2).unwrap();
        });

        thread::sleep(Duration::from_millis(20));
        assert_eq!(q.dequeue(Duration::from_millis(100)), Ok(1));
        handle.join().unwrap();
        assert_eq!(q.try_dequeue(), Ok(2));
    }

    #[test]
    fn blocked_consumer_wakes_on_set_finished() {
        let q: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::new(4));
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || q2.dequeue(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        q.set_finished();

        let result = handle.join().unwrap();
        assert_eq!(result, Err(DequeueError::Closed));
    }

    #[test]
    fn dequeue_times_out_on_empty_unfinished_queue() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        let result = q.dequeue(Duration::from_millis(15));
        assert_eq!(result, Err(DequeueError::Empty));
    }

    #[test]
    fn reopen_clears_and_unfinishes() {
        let q: BoundedQueue<i32> = BoundedQueue::new(4);
        q.enqueue(1).unwrap();
        q.set_finished();
        q.reopen();
        assert!(!q.is_finished());
        assert!(q.is_empty());
        q.enqueue(2).unwrap();
        assert_eq!(q.try_dequeue(), Ok(2));
    }
}
