//! Time synchronization coordinator
//!
//! Refreshing the official site time is expensive and is often
//! requested by several producers at once. The coordinator funnels every
//! request through one bus topic and collapses bursts:
//!
//! ```text
//!  producers ──TIMECHECK──▶ ┌──────────────────┐
//!  producers ──TIMECHECK──▶ │ auction_manager  │──▶ TimeSyncCoordinator
//!  producers ──FOO────────▶ └──────────────────┘         │
//!                                                        │ 1. default server reload_time_now()
//!                                                        │ 2. publish "Server time is now: …"
//!                                                        │ 3. drain queued TIMECHECKs
//!                                                        ▼
//!                                                  ┌──────────┐
//!                                                  │  Swing   │
//!                                                  └──────────┘
//! ```
//!
//! Messages other than the time-check command are ignored here and left
//! for other listeners.
//!
//! Status lines accumulate on the notify topic until something consumes
//! them; hosts register a listener there alongside the coordinator.

pub mod drain;

pub use drain::{DrainOutcome, drain_duplicates};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bus::MessageBus;
use crate::config::{DrainPolicy, TIMECHECK_COMMAND, TimeSyncConfig};
use crate::registry::ServerRegistry;
use crate::traits::{AuctionServer, MessageListener, MessageQueue};

/// Bus listener that serializes time checks against the default server
pub struct TimeSyncCoordinator {
    registry: Arc<ServerRegistry>,

    /// Queue the coordinator listens on and drains
    queue: Arc<dyn MessageQueue>,

    /// Queue that receives status text
    notifier: Arc<dyn MessageQueue>,

    command: String,
    policy: DrainPolicy,
}

impl TimeSyncCoordinator {
    /// Create a coordinator with the default command and drain policy
    pub fn new(
        registry: Arc<ServerRegistry>,
        queue: Arc<dyn MessageQueue>,
        notifier: Arc<dyn MessageQueue>,
    ) -> Self {
        Self {
            registry,
            queue,
            notifier,
            command: TIMECHECK_COMMAND.to_string(),
            policy: DrainPolicy::default(),
        }
    }

    /// Create a coordinator wired to the topics named in `config`
    pub fn from_config(registry: Arc<ServerRegistry>, bus: &MessageBus, config: &TimeSyncConfig) -> Self {
        Self {
            registry,
            queue: bus.queue(&config.topic),
            notifier: bus.queue(&config.notify_topic),
            command: config.command.clone(),
            policy: config.drain_policy,
        }
    }

    /// Use a different duplicate removal strategy
    pub fn with_policy(mut self, policy: DrainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Topic this coordinator listens on
    pub fn topic(&self) -> &str {
        self.queue.topic()
    }

    /// Run one time check and drain duplicate requests
    ///
    /// With no registered servers the refresh and status message are
    /// skipped, but the drain still runs.
    pub async fn check_time(&self) -> DrainOutcome {
        // The registry lock is released before any network I/O
        match self.registry.default_server() {
            Some(server) => self.refresh(server.as_ref()).await,
            None => debug!("No default server registered, skipping time refresh"),
        }

        drain_duplicates(self.queue.as_ref(), &self.command, self.policy)
    }

    async fn refresh(&self, server: &dyn AuctionServer) {
        if let Err(e) = server.reload_time_now().await {
            warn!(server = server.name(), error = %e, "Failed to reload server time; using last known offset");
        }

        let local = chrono::Local::now();
        let now = local
            .checked_add_signed(server.official_server_time_delta())
            .unwrap_or(local);
        let status = format!("Server time is now: {}", now.format("%a %b %d %H:%M:%S %:z %Y"));

        debug!("{}", status);
        self.notifier.enqueue(status);
    }
}

#[async_trait]
impl MessageListener for TimeSyncCoordinator {
    async fn message_action(&self, message: &str) {
        if message != self.command {
            return;
        }
        self.check_time().await;
    }
}

impl std::fmt::Debug for TimeSyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSyncCoordinator")
            .field("topic", &self.queue.topic())
            .field("notify_topic", &self.notifier.topic())
            .field("command", &self.command)
            .field("policy", &self.policy)
            .finish()
    }
}
