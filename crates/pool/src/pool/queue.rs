//! Priority wait queue for acquire requests that could not be served
//! immediately.
//!
//! Requests live in `priority_range` FIFO buckets. Bucket 0 is served
//! first; within a bucket, requests are served in enqueue order.

use std::collections::VecDeque;

use tokio::time::Instant;

/// A queued acquire request.
pub(crate) struct Waiter<T> {
    pub(crate) seq: u64,
    pub(crate) priority: usize,
    pub(crate) enqueued_at: Instant,
    pub(crate) payload: T,
}

pub(crate) struct WaitQueue<T> {
    buckets: Vec<VecDeque<Waiter<T>>>,
    next_seq: u64,
    len: usize,
}

impl<T> WaitQueue<T> {
    /// `priority_range` must be non-zero; `PoolConfig::validate` enforces it.
    pub(crate) fn new(priority_range: usize) -> Self {
        let buckets = (0..priority_range.max(1)).map(|_| VecDeque::new()).collect();
        Self {
            buckets,
            next_seq: 0,
            len: 0,
        }
    }

    /// Map any requested priority onto a valid bucket.
    pub(crate) fn clamp(&self, priority: usize) -> usize {
        priority.min(self.buckets.len() - 1)
    }

    /// Enqueue a request, returning its sequence number and clamped bucket.
    pub(crate) fn push(&mut self, priority: usize, payload: T) -> (u64, usize) {
        let priority = self.clamp(priority);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.buckets[priority].push_back(Waiter {
            seq,
            priority,
            enqueued_at: Instant::now(),
            payload,
        });
        self.len += 1;
        (seq, priority)
    }

    /// Pop the oldest request of the highest-priority non-empty bucket.
    pub(crate) fn pop(&mut self) -> Option<Waiter<T>> {
        let waiter = self
            .buckets
            .iter_mut()
            .find(|bucket| !bucket.is_empty())
            .and_then(VecDeque::pop_front)?;
        self.len -= 1;
        Some(waiter)
    }

    /// Remove a specific request, e.g. when its caller gave up waiting.
    pub(crate) fn remove(&mut self, seq: u64, priority: usize) -> Option<Waiter<T>> {
        let bucket = self.buckets.get_mut(priority)?;
        let index = bucket.iter().position(|w| w.seq == seq)?;
        let waiter = bucket.remove(index)?;
        self.len -= 1;
        Some(waiter)
    }

    /// Take every queued request, highest priority first.
    pub(crate) fn take_all(&mut self) -> Vec<Waiter<T>> {
        self.len = 0;
        self.buckets.iter_mut().flat_map(|b| b.drain(..)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pop_all(queue: &mut WaitQueue<&'static str>) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop().map(|w| w.payload)).collect()
    }

    #[test]
    fn single_bucket_is_fifo() {
        let mut queue = WaitQueue::new(1);
        queue.push(0, "a");
        queue.push(0, "b");
        queue.push(0, "c");
        assert_eq!(queue.len(), 3);
        assert_eq!(pop_all(&mut queue), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn lower_bucket_served_first_regardless_of_enqueue_order() {
        let mut queue = WaitQueue::new(3);
        queue.push(2, "low-1");
        queue.push(1, "mid-1");
        queue.push(2, "low-2");
        queue.push(0, "high-1");
        queue.push(1, "mid-2");
        queue.push(0, "high-2");
        assert_eq!(
            pop_all(&mut queue),
            vec!["high-1", "high-2", "mid-1", "mid-2", "low-1", "low-2"]
        );
    }

    #[test]
    fn out_of_range_priority_is_clamped_not_rejected() {
        let mut queue = WaitQueue::new(2);
        let (_, bucket) = queue.push(17, "clamped");
        assert_eq!(bucket, 1);
        queue.push(1, "after");
        queue.push(0, "high");
        assert_eq!(pop_all(&mut queue), vec!["high", "clamped", "after"]);
    }

    #[test]
    fn remove_by_seq_keeps_order_of_others() {
        let mut queue = WaitQueue::new(1);
        queue.push(0, "a");
        let (seq, bucket) = queue.push(0, "b");
        queue.push(0, "c");

        let removed = queue.remove(seq, bucket).expect("b is queued");
        assert_eq!(removed.payload, "b");
        assert!(queue.remove(seq, bucket).is_none());
        assert_eq!(queue.len(), 2);
        assert_eq!(pop_all(&mut queue), vec!["a", "c"]);
    }

    #[test]
    fn take_all_empties_queue_highest_priority_first() {
        let mut queue = WaitQueue::new(2);
        queue.push(1, "low");
        queue.push(0, "high");
        let taken: Vec<_> = queue.take_all().into_iter().map(|w| w.payload).collect();
        assert_eq!(taken, vec!["high", "low"]);
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }
}
