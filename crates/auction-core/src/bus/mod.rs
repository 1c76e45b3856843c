//! In-process message bus
//!
//! Topics are string-named queues. A listener registered on a topic gets
//! every message enqueued there, delivered by a per-topic dispatch task
//! that is decoupled from producers.
//!
//! ## Lifecycle
//!
//! 1. [`MessageBus::register_listener`] starts the topic's dispatch task
//!    on first use and returns a [`Subscription`]
//! 2. Producers call [`MessageBus::publish`] (or enqueue on
//!    [`MessageBus::queue`]) from any thread
//! 3. [`Subscription::unsubscribe`] removes one listener
//! 4. [`MessageBus::shutdown`] stops every dispatch task and waits for them;
//!    the bus cannot be subscribed to afterwards
//!
//! ## Delivery
//!
//! Each dispatch task handles one message at a time and awaits every
//! listener in registration order before taking the next. A listener can
//! therefore dequeue from its own topic without racing the dispatcher.
//! Messages enqueued while a topic has no listeners stay queued, and
//! queues are unbounded, so every topic that is published to needs a
//! consumer.

pub mod memory;

pub use memory::MemoryMessageQueue;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::{MessageListener, MessageQueue};

type ListenerList = Vec<(u64, Arc<dyn MessageListener>)>;

/// Listener ids are unique across every bus in the process
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// One topic: its queue, its listeners and whether its task is running
struct Topic {
    queue: Arc<MemoryMessageQueue>,
    listeners: RwLock<ListenerList>,
    dispatching: AtomicBool,
}

impl Topic {
    fn new(name: &str) -> Self {
        Self {
            queue: Arc::new(MemoryMessageQueue::new(name)),
            listeners: RwLock::new(Vec::new()),
            dispatching: AtomicBool::new(false),
        }
    }

    fn listeners(&self) -> Vec<Arc<dyn MessageListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

struct BusInner {
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
}

impl BusInner {
    fn topic(&self, name: &str) -> Arc<Topic> {
        let mut topics = lock(&self.topics);
        Arc::clone(
            topics
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Topic::new(name))),
        )
    }
}

/// Topic-based in-process message bus
///
/// Cloning is cheap; clones share the same topics and dispatch tasks.
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl MessageBus {
    /// Create a bus with no topics
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(BusInner {
                topics: Mutex::new(HashMap::new()),
                tasks: Mutex::new(Vec::new()),
                shutdown_tx,
            }),
        }
    }

    /// The queue for `topic`, created on first use
    pub fn queue(&self, topic: &str) -> Arc<MemoryMessageQueue> {
        Arc::clone(&self.inner.topic(topic).queue)
    }

    /// Enqueue `message` on `topic`
    pub fn publish(&self, topic: &str, message: impl Into<String>) {
        self.inner.topic(topic).queue.enqueue(message.into());
    }

    /// Deliver every message on `topic` to `listener`
    ///
    /// Starts the topic's dispatch task if this is the first listener.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// - `Ok(Subscription)`: Listener registered and a dispatch task is running
    /// - `Err(Error::BusClosed)`: [`shutdown`](Self::shutdown) has already been called
    pub fn register_listener(&self, topic: &str, listener: Arc<dyn MessageListener>) -> Result<Subscription> {
        // Held across registration so shutdown cannot slip in between
        let mut tasks = lock(&self.inner.tasks);
        if *self.inner.shutdown_tx.borrow() {
            return Err(Error::BusClosed(topic.to_string()));
        }

        let entry = self.inner.topic(topic);
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);

        entry
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));

        if !entry.dispatching.swap(true, Ordering::SeqCst) {
            let shutdown_rx = self.inner.shutdown_tx.subscribe();
            let handle = tokio::spawn(dispatch(Arc::clone(&entry), shutdown_rx));
            tasks.push(handle);
            debug!("Started dispatch task for topic {}", topic);
        }

        // Messages may have queued up before anyone was listening
        entry.queue.wake();

        Ok(Subscription {
            bus: Arc::clone(&self.inner),
            topic: topic.to_string(),
            id,
        })
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    /// Stop all dispatch tasks and wait for them to finish
    ///
    /// A message being delivered when shutdown is requested finishes
    /// delivery first. Pending messages stay in their queues. Later
    /// listener registrations fail with [`Error::BusClosed`].
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = lock(&self.inner.tasks);
            self.inner.shutdown_tx.send_replace(true);
            tasks.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Dispatch task ended abnormally: {}", e);
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics: Vec<String> = lock(&self.inner.topics).keys().cloned().collect();
        f.debug_struct("MessageBus").field("topics", &topics).finish()
    }
}

/// Handle for one registered listener
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) to tear down.
#[must_use = "dropping a Subscription leaves the listener registered"]
pub struct Subscription {
    bus: Arc<BusInner>,
    topic: String,
    id: u64,
}

impl Subscription {
    /// Topic this subscription listens on
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Listener id, unique within the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener from its topic
    ///
    /// The topic's dispatch task keeps running, so messages published
    /// afterwards are consumed by any remaining listeners, or wait in the
    /// queue if there are none.
    pub fn unsubscribe(self) {
        let topic = self.bus.topic(&self.topic);
        topic
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != self.id);
        debug!("Unsubscribed listener {} from topic {}", self.id, self.topic);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

async fn dispatch(topic: Arc<Topic>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            return;
        }

        // Deliver until the queue is empty or nobody is listening
        loop {
            let listeners = topic.listeners();
            if listeners.is_empty() {
                break;
            }
            let Some(message) = topic.queue.dequeue() else {
                break;
            };

            for listener in &listeners {
                listener.message_action(&message).await;
            }

            if *shutdown_rx.borrow() {
                return;
            }
        }

        tokio::select! {
            _ = topic.queue.notified() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return;
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
