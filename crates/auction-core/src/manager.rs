//! Auction server manager
//!
//! The manager is the composition root for everything in this crate. It
//! owns the [`ServerRegistry`] and hands out loaders, resolvers and the
//! time-sync coordinator bound to that same registry, so there is no
//! process-wide singleton.
//!
//! ## Lifecycle
//!
//! 1. Create with [`AuctionServerManager::new()`] and register factories
//! 2. Populate with [`AuctionServerManager::load()`]
//! 3. Subscribe time sync with [`AuctionServerManager::start_time_sync()`]
//! 4. On shutdown, unsubscribe and persist [`AuctionServerManager::to_config_tree()`]

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::bus::{MessageBus, Subscription};
use crate::config::{ConfigNode, ManagerConfig};
use crate::error::{Error, Result};
use crate::loader::ServerLoader;
use crate::registry::{ServerFactories, ServerRegistry};
use crate::resolver::DispatchResolver;
use crate::timesync::TimeSyncCoordinator;
use crate::traits::{AuctionEntry, AuctionServer, ConfigSurface, EntryStore, SearchManager};

/// Tag of the root node produced by [`AuctionServerManager::to_config_tree`]
pub const AUCTIONS_TAG: &str = "auctions";

/// Owns the active servers and exposes whole-registry operations
pub struct AuctionServerManager {
    config: ManagerConfig,
    registry: Arc<ServerRegistry>,
    factories: Arc<ServerFactories>,
    entry_store: Option<Arc<dyn EntryStore>>,

    /// Topic and listener id of the coordinator while it is subscribed
    time_sync_subscription: Mutex<Option<(String, u64)>>,
}

impl AuctionServerManager {
    /// Create a manager with an empty registry
    pub fn new(config: ManagerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            registry: Arc::new(ServerRegistry::new()),
            factories: Arc::new(ServerFactories::new()),
            entry_store: None,
            time_sync_subscription: Mutex::new(None),
        })
    }

    /// Attach the shared auction-entry store
    pub fn with_entry_store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.entry_store = Some(store);
        self
    }

    /// Manager settings
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The registry of active servers
    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    /// The factory table used when loading configuration
    pub fn factories(&self) -> &Arc<ServerFactories> {
        &self.factories
    }

    /// A loader bound to this manager's registry, factories and entry store
    pub fn loader(&self) -> ServerLoader {
        let loader = ServerLoader::new(Arc::clone(&self.registry), Arc::clone(&self.factories));
        match &self.entry_store {
            Some(store) => loader.with_entry_store(Arc::clone(store)),
            None => loader,
        }
    }

    /// A resolver bound to this manager's registry
    pub fn resolver(&self) -> DispatchResolver {
        DispatchResolver::new(Arc::clone(&self.registry))
    }

    /// A time-sync coordinator wired to `bus` per this manager's settings
    pub fn time_sync(&self, bus: &MessageBus) -> TimeSyncCoordinator {
        TimeSyncCoordinator::from_config(Arc::clone(&self.registry), bus, &self.config.time_sync)
    }

    /// Load servers from a persisted `auctions` tree
    ///
    /// See [`ServerLoader::load`] for failure semantics.
    pub fn load(&self, root: &ConfigNode) -> Result<()> {
        self.loader().load(root)
    }

    /// Subscribe the time-sync coordinator to its bus topic
    ///
    /// # Returns
    ///
    /// - `Ok(Subscription)`: Pass to [`stop_time_sync`](Self::stop_time_sync) on shutdown
    /// - `Err(Error::Config)`: Already subscribed
    /// - `Err(Error::BusClosed)`: `bus` has been shut down
    pub fn start_time_sync(&self, bus: &MessageBus) -> Result<Subscription> {
        let mut active = self
            .time_sync_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some((topic, _)) = active.as_ref() {
            return Err(Error::config(format!(
                "Time sync is already subscribed to topic '{}'",
                topic
            )));
        }

        let coordinator = Arc::new(self.time_sync(bus));
        let topic = coordinator.topic().to_string();
        let subscription = bus.register_listener(&topic, coordinator)?;

        info!("Time sync subscribed to topic {}", topic);
        *active = Some((topic, subscription.id()));
        Ok(subscription)
    }

    /// Tear down a subscription made by [`start_time_sync`](Self::start_time_sync)
    ///
    /// The subscription is always removed from its bus, but only the one
    /// returned by this manager's `start_time_sync` marks time sync as
    /// stopped.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Time sync is no longer subscribed
    /// - `Err(Error::Config)`: `subscription` was not this manager's time-sync subscription
    pub fn stop_time_sync(&self, subscription: Subscription) -> Result<()> {
        let mut active = self
            .time_sync_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let owned = matches!(
            active.as_ref(),
            Some((topic, id)) if topic == subscription.topic() && *id == subscription.id()
        );
        let topic = subscription.topic().to_string();
        subscription.unsubscribe();

        if !owned {
            warn!("Subscription on topic {} is not this manager's time sync", topic);
            return Err(Error::config(format!(
                "Subscription on topic '{}' was not created by start_time_sync",
                topic
            )));
        }

        info!("Time sync unsubscribed from topic {}", topic);
        *active = None;
        Ok(())
    }

    /// Register a server under its own name (idempotent)
    pub fn add_server(&self, server: Arc<dyn AuctionServer>) -> Arc<dyn AuctionServer> {
        self.registry.add_server(server)
    }

    /// Register a server under `name` (idempotent)
    pub fn add_server_named(&self, name: &str, server: Arc<dyn AuctionServer>) -> Arc<dyn AuctionServer> {
        self.registry.add(name, server)
    }

    /// Look up a server by name
    pub fn server_by_name(&self, name: &str) -> Option<Arc<dyn AuctionServer>> {
        self.registry.by_name(name)
    }

    /// All servers in registry order
    pub fn servers(&self) -> Vec<Arc<dyn AuctionServer>> {
        self.registry.all()
    }

    /// The first server ever registered
    pub fn default_server(&self) -> Option<Arc<dyn AuctionServer>> {
        self.registry.default_server()
    }

    /// Current time according to the default server
    ///
    /// `None` when no server is registered.
    pub fn default_server_time(&self) -> Option<String> {
        self.default_server().map(|server| server.time())
    }

    /// Serialize all servers under an `auctions` root
    ///
    /// The root's `count` attribute is the total auction count across
    /// servers.
    pub fn to_config_tree(&self) -> ConfigNode {
        let servers = self.registry.all();
        let mut root = ConfigNode::new(AUCTIONS_TAG);
        let mut count = 0usize;

        for server in &servers {
            count += server.auction_count();
            root.add_child(server.to_config_tree());
        }

        root.set_property("count", count.to_string());
        root
    }

    /// Route an entry to its server's `register_auction`
    ///
    /// Entries without a server, or naming an unregistered server, are
    /// ignored.
    pub fn add_entry(&self, entry: &AuctionEntry) {
        if let Some(server) = self.server_for_entry(entry) {
            server.register_auction(entry);
        }
    }

    /// Route an entry to its server's `unregister_auction`
    pub fn delete_entry(&self, entry: &AuctionEntry) {
        if let Some(server) = self.server_for_entry(entry) {
            server.unregister_auction(entry);
        }
    }

    /// Register every stored entry with its server
    ///
    /// # Returns
    ///
    /// Number of entries that were routed to a registered server.
    pub async fn register_stored_entries(&self) -> Result<usize> {
        let Some(store) = &self.entry_store else {
            return Ok(0);
        };

        let mut routed = 0;
        for entry in store.list_entries().await? {
            if let Some(server) = self.server_for_entry(&entry) {
                server.register_auction(&entry);
                routed += 1;
            }
        }

        info!("Registered {} stored auction(s)", routed);
        Ok(routed)
    }

    /// Ask every server to install its menu entries
    pub fn establish_menus(&self) {
        for server in self.registry.all() {
            server.establish_menu();
        }
    }

    /// Ask every server to contribute its searches
    pub fn add_searches(&self, searches: &dyn SearchManager) {
        for server in self.registry.all() {
            server.add_searches(searches);
        }
    }

    /// Ask every server to cancel its searches
    pub fn cancel_searches(&self) {
        for server in self.registry.all() {
            server.cancel_searches();
        }
    }

    /// Configuration surfaces of every server, rebuilt on each call
    pub fn configuration_surfaces(&self) -> Vec<ConfigSurface> {
        self.registry.configuration_surfaces()
    }

    fn server_for_entry(&self, entry: &AuctionEntry) -> Option<Arc<dyn AuctionServer>> {
        let name = entry.server.as_deref()?;
        let server = self.registry.by_name(name);
        if server.is_none() {
            debug!("Entry {} names unregistered server {}", entry.identifier, name);
        }
        server
    }
}

impl std::fmt::Debug for AuctionServerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionServerManager")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("factories", &self.factories)
            .finish()
    }
}
