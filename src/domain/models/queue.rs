use std::collections::VecDeque;

use super::task::TaskPriority;

const TIERS: usize = TaskPriority::DESCENDING.len();

/// Queue item tagged with its enqueue sequence.
///
/// The sequence is assigned on every enqueue, so an item that leaves and
/// re-enters the queue goes to the back of the line.
#[derive(Debug, Clone)]
struct QueueItem<T> {
    seq: u64,
    item: T,
}

/// Dispatch queue with per-tier FIFO lanes.
///
/// Two selection policies share the same storage:
///
/// - **priority**: front of the most urgent non-empty lane
/// - **fifo**: the lane front with the smallest enqueue sequence
///
/// Each lane is sorted by sequence because sequences only grow, so both
/// policies pick in O(tiers).
///
/// # Examples
///
/// ```
/// use batchq::domain::models::{DispatchQueue, TaskPriority};
///
/// let mut queue = DispatchQueue::new();
/// queue.enqueue("low", TaskPriority::Low);
/// queue.enqueue("urgent", TaskPriority::Urgent);
/// queue.enqueue("normal", TaskPriority::Normal);
///
/// assert_eq!(queue.dequeue(true), Some("urgent"));
/// assert_eq!(queue.dequeue(true), Some("normal"));
/// assert_eq!(queue.dequeue(true), Some("low"));
/// ```
#[derive(Debug, Clone)]
pub struct DispatchQueue<T> {
    lanes: [VecDeque<QueueItem<T>>; TIERS],
    next_seq: u64,
}

impl<T> DispatchQueue<T> {
    pub fn new() -> Self {
        Self {
            lanes: std::array::from_fn(|_| VecDeque::new()),
            next_seq: 0,
        }
    }

    /// Append an item to the tail of its priority lane.
    pub fn enqueue(&mut self, item: T, priority: TaskPriority) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.lanes[priority.tier_index()].push_back(QueueItem { seq, item });
    }

    /// Remove and return the next item under the selected policy.
    pub fn dequeue(&mut self, priority_enabled: bool) -> Option<T> {
        let lane = self.select_lane(priority_enabled)?;
        self.lanes[lane].pop_front().map(|queued| queued.item)
    }

    /// Next item under the selected policy, without removing it.
    pub fn peek(&self, priority_enabled: bool) -> Option<&T> {
        let lane = self.select_lane(priority_enabled)?;
        self.lanes[lane].front().map(|queued| &queued.item)
    }

    fn select_lane(&self, priority_enabled: bool) -> Option<usize> {
        if priority_enabled {
            self.lanes.iter().position(|lane| !lane.is_empty())
        } else {
            self.lanes
                .iter()
                .enumerate()
                .filter_map(|(index, lane)| lane.front().map(|front| (front.seq, index)))
                .min()
                .map(|(_, index)| index)
        }
    }

    pub fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            lane.clear();
        }
    }

    /// Items in global enqueue order, independent of priority.
    pub fn iter_fifo(&self) -> impl Iterator<Item = &T> {
        let mut items: Vec<&QueueItem<T>> = self.lanes.iter().flatten().collect();
        items.sort_by_key(|queued| queued.seq);
        items.into_iter().map(|queued| &queued.item)
    }

    /// Items in the order they would be dispatched under the selected policy.
    pub fn iter_dispatch_order(&self, priority_enabled: bool) -> Vec<&T> {
        if priority_enabled {
            self.lanes
                .iter()
                .flatten()
                .map(|queued| &queued.item)
                .collect()
        } else {
            self.iter_fifo().collect()
        }
    }

    /// Removes and returns items matching a predicate, in enqueue order per lane.
    pub fn remove_matching<F>(&mut self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        let mut removed = Vec::new();
        for lane in &mut self.lanes {
            let mut i = 0;
            while i < lane.len() {
                if predicate(&lane[i].item) {
                    if let Some(queued) = lane.remove(i) {
                        removed.push(queued.item);
                    }
                } else {
                    i += 1;
                }
            }
        }
        removed
    }

    pub fn count_matching<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.lanes
            .iter()
            .flatten()
            .filter(|queued| predicate(&queued.item))
            .count()
    }
}

impl<T> Default for DispatchQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskPriority::{High, Low, Normal, Urgent};

    #[test]
    fn test_new_queue_is_empty() {
        let queue: DispatchQueue<u32> = DispatchQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.peek(true), None);
        assert_eq!(queue.peek(false), None);
    }

    #[test]
    fn test_priority_policy_orders_by_tier_then_fifo() {
        let mut queue = DispatchQueue::new();
        queue.enqueue("N-A", Normal);
        queue.enqueue("U-A", Urgent);
        queue.enqueue("L-A", Low);
        queue.enqueue("N-B", Normal);
        queue.enqueue("H-A", High);
        queue.enqueue("U-B", Urgent);

        let order: Vec<_> = std::iter::from_fn(|| queue.dequeue(true)).collect();
        assert_eq!(order, vec!["U-A", "U-B", "H-A", "N-A", "N-B", "L-A"]);
    }

    #[test]
    fn test_fifo_policy_ignores_tiers() {
        let mut queue = DispatchQueue::new();
        queue.enqueue(1, Low);
        queue.enqueue(2, Urgent);
        queue.enqueue(3, Normal);

        assert_eq!(queue.dequeue(false), Some(1));
        assert_eq!(queue.dequeue(false), Some(2));
        assert_eq!(queue.dequeue(false), Some(3));
        assert_eq!(queue.dequeue(false), None);
    }

    #[test]
    fn test_requeue_goes_to_back_of_lane() {
        let mut queue = DispatchQueue::new();
        queue.enqueue("first", Normal);
        queue.enqueue("second", Normal);

        let head = queue.dequeue(true).unwrap();
        queue.enqueue(head, Normal);

        assert_eq!(queue.dequeue(true), Some("second"));
        assert_eq!(queue.dequeue(true), Some("first"));
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = DispatchQueue::new();
        queue.enqueue("item", High);

        assert_eq!(queue.peek(true), Some(&"item"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_iter_fifo_and_dispatch_order() {
        let mut queue = DispatchQueue::new();
        queue.enqueue(1, Low);
        queue.enqueue(2, Urgent);
        queue.enqueue(3, Normal);

        let fifo: Vec<i32> = queue.iter_fifo().copied().collect();
        assert_eq!(fifo, vec![1, 2, 3]);

        let prioritized: Vec<i32> = queue.iter_dispatch_order(true).into_iter().copied().collect();
        assert_eq!(prioritized, vec![2, 3, 1]);
    }

    #[test]
    fn test_remove_matching() {
        let mut queue = DispatchQueue::new();
        queue.enqueue(1, Normal);
        queue.enqueue(2, Urgent);
        queue.enqueue(3, Normal);
        queue.enqueue(4, Low);

        let removed = queue.remove_matching(|&item| item % 2 == 0);
        assert_eq!(removed, vec![2, 4]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.count_matching(|_| true), 2);
    }

    #[test]
    fn test_clear() {
        let mut queue = DispatchQueue::new();
        queue.enqueue("a", Normal);
        queue.enqueue("b", Urgent);
        queue.clear();
        assert!(queue.is_empty());
    }
}
