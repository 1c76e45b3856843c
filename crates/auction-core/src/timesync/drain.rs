//! Duplicate removal for time-check commands
//!
//! After a time check runs, any further copies of the command waiting in
//! the queue are redundant. These helpers remove them without losing the
//! first unrelated message behind them.

use crate::config::DrainPolicy;
use crate::traits::MessageQueue;

/// How a drain ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The queue ran dry before any other message appeared
    Exhausted,

    /// An unrelated message was dequeued and put back at the tail
    Requeued(String),

    /// An unrelated message was found at the head and left in place
    Preserved(String),
}

/// Remove queued copies of `command` according to `policy`
///
/// Both policies rely on the caller being the only consumer of `queue`
/// while the drain runs; producers may keep enqueuing at the tail.
pub fn drain_duplicates(queue: &dyn MessageQueue, command: &str, policy: DrainPolicy) -> DrainOutcome {
    match policy {
        DrainPolicy::DrainAndRequeue => drain_and_requeue(queue, command),
        DrainPolicy::PeekAndDiscard => peek_and_discard(queue, command),
    }
}

fn drain_and_requeue(queue: &dyn MessageQueue, command: &str) -> DrainOutcome {
    loop {
        match queue.dequeue() {
            None => return DrainOutcome::Exhausted,
            Some(message) if message == command => continue,
            Some(message) => {
                // Not another time check, so it belongs to someone else
                queue.enqueue(message.clone());
                return DrainOutcome::Requeued(message);
            }
        }
    }
}

fn peek_and_discard(queue: &dyn MessageQueue, command: &str) -> DrainOutcome {
    loop {
        match queue.peek() {
            None => return DrainOutcome::Exhausted,
            Some(message) if message == command => {
                queue.dequeue();
            }
            Some(message) => return DrainOutcome::Preserved(message),
        }
    }
}
