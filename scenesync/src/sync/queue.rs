//! Blocking deques connecting the foreground caller and the sync worker.
//!
//! Two queues exist per worker:
//!
//! - [`RequestQueue`] carries work from any number of producers to the single
//!   worker thread. Both insertion and removal happen at the head, so the most
//!   recently submitted request is serviced next (stack order). Requests for
//!   the observer's current location therefore preempt the large background
//!   backlog queued at startup.
//! - [`FreshTileChannel`] carries directories that newly appeared back to the
//!   foreground, which drains it without ever blocking.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

use super::request::SyncRequest;

/// Thread-safe double-ended queue with a blocking pop.
///
/// The consumer parks on a condition variable until an item is pushed; it
/// never spins.
#[derive(Debug)]
pub struct BlockingDeque<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> BlockingDeque<T> {
    /// Create an empty deque.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Insert at the head and wake one waiting consumer.
    pub fn push_front(&self, item: T) {
        self.items.lock().push_front(item);
        self.available.notify_one();
    }

    /// Insert at the tail and wake one waiting consumer.
    pub fn push_back(&self, item: T) {
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Remove from the head, blocking until an item is available.
    pub fn pop_front(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    /// Remove from the head without blocking.
    pub fn try_pop_front(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Discard all queued items.
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl<T> Default for BlockingDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An entry in the worker's request queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEntry {
    /// Synchronize a directory.
    Request(SyncRequest),
    /// Wake the worker and make it exit.
    Stop,
}

/// Stack-ordered request queue with many producers and one blocking consumer.
#[derive(Debug, Default)]
pub struct RequestQueue {
    entries: BlockingDeque<QueueEntry>,
}

impl RequestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a request. It becomes the next one to be serviced.
    pub fn push(&self, request: SyncRequest) {
        self.entries.push_front(QueueEntry::Request(request));
    }

    /// Enqueue the stop sentinel at the head so a blocked consumer wakes.
    pub fn push_stop(&self) {
        self.entries.push_front(QueueEntry::Stop);
    }

    /// Take the next entry, blocking until one is available.
    pub fn pop(&self) -> QueueEntry {
        self.entries.pop_front()
    }

    /// Take the next entry without blocking.
    pub fn try_pop(&self) -> Option<QueueEntry> {
        self.entries.try_pop_front()
    }

    /// True when no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every pending entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Directories that newly appeared locally and need a display refresh.
///
/// The worker appends; the foreground drains with [`FreshTileChannel::drain`]
/// or [`FreshTileChannel::try_pop`], neither of which blocks.
#[derive(Debug, Default)]
pub struct FreshTileChannel {
    tiles: BlockingDeque<SyncRequest>,
}

impl FreshTileChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly materialized directory.
    pub fn push(&self, request: SyncRequest) {
        self.tiles.push_back(request);
    }

    /// Take the oldest fresh directory, if any.
    pub fn try_pop(&self) -> Option<SyncRequest> {
        self.tiles.try_pop_front()
    }

    /// Take every fresh directory currently queued, oldest first.
    pub fn drain(&self) -> Vec<SyncRequest> {
        std::iter::from_fn(|| self.tiles.try_pop_front()).collect()
    }

    /// True when there is nothing to refresh.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of queued fresh directories.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn request(dir: &str) -> SyncRequest {
        SyncRequest::background(dir)
    }

    #[test]
    fn test_push_pop_is_last_in_first_out() {
        let queue = RequestQueue::new();
        queue.push(request("Airports/K"));
        queue.push(request("Models"));
        queue.push(request("Terrain/e000n50/e008n53"));

        assert_eq!(
            queue.pop(),
            QueueEntry::Request(request("Terrain/e000n50/e008n53"))
        );
        assert_eq!(queue.pop(), QueueEntry::Request(request("Models")));
        assert_eq!(queue.pop(), QueueEntry::Request(request("Airports/K")));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stop_sentinel_preempts_backlog() {
        let queue = RequestQueue::new();
        queue.push(request("Models"));
        queue.push_stop();
        assert_eq!(queue.pop(), QueueEntry::Stop);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_discards_pending() {
        let queue = RequestQueue::new();
        for letter in ['A', 'B', 'C'] {
            queue.push(request(&format!("Airports/{}", letter)));
        }
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(RequestQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };

        thread::sleep(Duration::from_millis(50));
        queue.push(request("Models"));

        let entry = consumer.join().unwrap();
        assert_eq!(entry, QueueEntry::Request(request("Models")));
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = Arc::new(RequestQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..50 {
                        queue.push(request(&format!("p{}/{}", p, i)));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(queue.len(), 200);
    }

    #[test]
    fn test_fresh_channel_is_fifo() {
        let channel = FreshTileChannel::new();
        channel.push(SyncRequest::new("Terrain/a", true));
        channel.push(SyncRequest::new("Terrain/b", true));

        let drained = channel.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].dir(), "Terrain/a");
        assert_eq!(drained[1].dir(), "Terrain/b");
        assert!(channel.is_empty());
        assert_eq!(channel.try_pop(), None);
    }

    proptest! {
        #[test]
        fn prop_pop_returns_reverse_submission_order(dirs in prop::collection::vec("[a-z]{1,8}", 1..40)) {
            let queue = RequestQueue::new();
            for dir in &dirs {
                queue.push(request(dir));
            }
            for dir in dirs.iter().rev() {
                prop_assert_eq!(queue.pop(), QueueEntry::Request(request(dir)));
            }
            prop_assert!(queue.is_empty());
        }
    }
}
