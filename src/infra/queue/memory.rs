//! In-memory FIFO queue of pending task entries.

use std::collections::VecDeque;

use crate::core::SchedulerError;

/// Strict first-in-first-out queue.
///
/// Items are appended at the tail and removed only from the head; there is no
/// reordering and no priority.
#[derive(Debug)]
pub struct InMemoryQueue<T> {
    items: VecDeque<T>,
}

impl<T> InMemoryQueue<T> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item at the tail. O(1) amortized.
    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove and return the head item.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EmptyQueue`] when nothing is pending.
    pub fn dequeue_head(&mut self) -> Result<T, SchedulerError> {
        self.items.pop_front().ok_or(SchedulerError::EmptyQueue)
    }

    /// Discard every pending item and hand them back in queue order.
    ///
    /// Nothing is executed or settled here; the caller decides when the
    /// returned items are dropped.
    pub fn clear(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Current pending count.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for InMemoryQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = InMemoryQueue::new();
        q.enqueue("a");
        q.enqueue("b");
        q.enqueue("c");

        assert_eq!(q.len(), 3);
        assert_eq!(q.dequeue_head().unwrap(), "a");
        assert_eq!(q.dequeue_head().unwrap(), "b");

        q.enqueue("d");
        assert_eq!(q.dequeue_head().unwrap(), "c");
        assert_eq!(q.dequeue_head().unwrap(), "d");
        assert!(q.is_empty());
    }

    #[test]
    fn test_empty_queue() {
        let mut q = InMemoryQueue::<u32>::new();
        assert_eq!(q.dequeue_head(), Err(SchedulerError::EmptyQueue));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_clear_returns_pending_in_order() {
        let mut q = InMemoryQueue::new();
        for i in 1..=4 {
            q.enqueue(i);
        }

        let dropped = q.clear();
        assert_eq!(dropped, vec![1, 2, 3, 4]);
        assert!(q.is_empty());

        // Clearing again is a no-op
        assert!(q.clear().is_empty());

        // The queue is reusable after a clear
        q.enqueue(5);
        assert_eq!(q.dequeue_head().unwrap(), 5);
    }
}
