// # Message Queue Trait
//
// String-named topics carrying string commands. The time-sync coordinator
// listens on one topic, drains duplicates from it, and publishes status
// text to another.
//
// The in-process implementation lives in `crate::bus`.

use async_trait::async_trait;

/// A FIFO of string messages for one topic
///
/// All operations are non-blocking. An empty queue is reported as `None`,
/// which callers treat as a normal condition.
pub trait MessageQueue: Send + Sync {
    /// Topic this queue serves
    fn topic(&self) -> &str;

    /// Append a message at the tail
    fn enqueue(&self, message: String);

    /// Remove and return the head message, or `None` if empty
    fn dequeue(&self) -> Option<String>;

    /// Return a copy of the head message without removing it
    fn peek(&self) -> Option<String>;

    /// Number of pending messages
    fn len(&self) -> usize;

    /// Check if no messages are pending
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives every message delivered on a subscribed topic
///
/// Delivery happens on the topic's dispatch task, one message at a time,
/// so a listener may safely dequeue from its own topic while handling a
/// message.
#[async_trait]
pub trait MessageListener: Send + Sync {
    /// Handle one delivered message
    async fn message_action(&self, message: &str);
}
