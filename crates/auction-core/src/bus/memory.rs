// # Memory Message Queue
//
// In-memory implementation of MessageQueue.
//
// Messages live in a `VecDeque` behind a mutex. Every enqueue wakes the
// topic's dispatch task through a `Notify`; a wake-up that arrives while
// the task is busy is stored as a permit, so none is lost.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::traits::MessageQueue;

/// In-memory FIFO for one topic
///
/// # Example
///
/// ```rust
/// use auction_core::bus::MemoryMessageQueue;
/// use auction_core::traits::MessageQueue;
///
/// let queue = MemoryMessageQueue::new("auction_manager");
/// queue.enqueue("TIMECHECK".to_string());
/// assert_eq!(queue.dequeue().as_deref(), Some("TIMECHECK"));
/// assert_eq!(queue.dequeue(), None);
/// ```
#[derive(Debug)]
pub struct MemoryMessageQueue {
    topic: String,
    items: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl MemoryMessageQueue {
    /// Create an empty queue for `topic`
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Copy of all pending messages, head first
    pub fn snapshot(&self) -> Vec<String> {
        self.items().iter().cloned().collect()
    }

    /// Wait until a message is enqueued or [`wake`](Self::wake) is called
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Wake the dispatch task without enqueuing anything
    pub(crate) fn wake(&self) {
        self.notify.notify_one();
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageQueue for MemoryMessageQueue {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn enqueue(&self, message: String) {
        self.items().push_back(message);
        self.notify.notify_one();
    }

    fn dequeue(&self) -> Option<String> {
        self.items().pop_front()
    }

    fn peek(&self) -> Option<String> {
        self.items().front().cloned()
    }

    fn len(&self) -> usize {
        self.items().len()
    }
}
