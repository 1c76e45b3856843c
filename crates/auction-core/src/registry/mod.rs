//! Registry of active auction servers
//!
//! The registry is an ordered, name-unique collection of server
//! instances. Insertion order matters: resolution is first-match in
//! registry order, and the first server ever added is the default time
//! source.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auction_core::registry::ServerRegistry;
//!
//! let registry = ServerRegistry::new();
//! let ebay = registry.add("ebay", Arc::new(EbayServer::default()));
//!
//! // Adding again (by name or by instance) returns the existing entry
//! let same = registry.add("ebay", Arc::new(EbayServer::default()));
//! assert!(same_server(&ebay, &same));
//! ```

pub mod factory;

pub use factory::ServerFactories;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::traits::{AuctionServer, ConfigSurface, same_server};

/// One registered server under its registration name
struct RegistryEntry {
    name: String,
    server: Arc<dyn AuctionServer>,
}

#[derive(Default)]
struct RegistryInner {
    /// Entries in insertion order
    entries: Vec<RegistryEntry>,
}

/// Ordered, name-unique collection of active servers
///
/// ## Thread Safety
///
/// A single `RwLock` covers the entry list, so the duplicate check in
/// [`add`](Self::add) and the append that follows it see one consistent
/// snapshot. Readers get cloned `Arc`s and release the
/// lock before calling into any server.
#[derive(Default)]
pub struct ServerRegistry {
    inner: RwLock<RegistryInner>,
}

impl ServerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server under `name`
    ///
    /// If an entry with this name, or this exact instance, already
    /// exists, the existing server is returned and nothing changes.
    /// Otherwise the server is appended and returned. No server code runs
    /// while the lock is held.
    pub fn add(&self, name: &str, server: Arc<dyn AuctionServer>) -> Arc<dyn AuctionServer> {
        let mut inner = self.write();

        if let Some(existing) = inner
            .entries
            .iter()
            .find(|entry| entry.name == name || same_server(&entry.server, &server))
        {
            debug!("Server {} already registered as {}", name, existing.name);
            return Arc::clone(&existing.server);
        }

        inner.entries.push(RegistryEntry {
            name: name.to_string(),
            server: Arc::clone(&server),
        });
        info!("Registered auction server {}", name);

        server
    }

    /// Register a server under its own [`name`](AuctionServer::name)
    pub fn add_server(&self, server: Arc<dyn AuctionServer>) -> Arc<dyn AuctionServer> {
        let name = server.name().to_string();
        self.add(&name, server)
    }

    /// Look up a server by exact name
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn AuctionServer>> {
        self.read()
            .entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.server))
    }

    /// Snapshot of all servers in insertion order
    pub fn all(&self) -> Vec<Arc<dyn AuctionServer>> {
        self.read()
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.server))
            .collect()
    }

    /// Registration names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.read()
            .entries
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// The first server ever added, or `None` if the registry is empty
    pub fn default_server(&self) -> Option<Arc<dyn AuctionServer>> {
        self.read()
            .entries
            .first()
            .map(|entry| Arc::clone(&entry.server))
    }

    /// Number of registered servers
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Check if no servers are registered
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Build the configuration surface of every server, in registry order
    ///
    /// Nothing is cached; every call asks each server afresh, outside the
    /// registry lock.
    pub fn configuration_surfaces(&self) -> Vec<ConfigSurface> {
        self.all()
            .iter()
            .map(|server| server.configuration_surface())
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRegistry")
            .field("servers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigNode;
    use async_trait::async_trait;
    use url::Url;

    struct NamedServer {
        name: String,
    }

    impl NamedServer {
        fn shared(name: &str) -> Arc<dyn AuctionServer> {
            Arc::new(Self {
                name: name.to_string(),
            })
        }
    }

    #[async_trait]
    impl AuctionServer for NamedServer {
        fn name(&self) -> &str {
            &self.name
        }
        fn check_if_identifier_is_handled(&self, _identifier: &str) -> bool {
            false
        }
        fn handles_site(&self, _url: &Url) -> bool {
            false
        }
        async fn reload_time_now(&self) -> crate::Result<()> {
            Ok(())
        }
        fn official_server_time_delta(&self) -> chrono::TimeDelta {
            chrono::TimeDelta::zero()
        }
        fn time(&self) -> String {
            String::new()
        }
        fn auction_count(&self) -> usize {
            0
        }
        fn to_config_tree(&self) -> ConfigNode {
            ConfigNode::new("server").with_property("NAME", self.name.clone())
        }
        fn from_config_tree(&self, _node: &ConfigNode) -> crate::Result<()> {
            Ok(())
        }
        fn configuration_surface(&self) -> ConfigSurface {
            ConfigSurface::new(self.name.clone(), self.name.clone())
        }
    }

    #[test]
    fn add_preserves_insertion_order() {
        let registry = ServerRegistry::new();
        registry.add_server(NamedServer::shared("b"));
        registry.add_server(NamedServer::shared("a"));
        registry.add_server(NamedServer::shared("c"));

        assert_eq!(registry.names(), ["b", "a", "c"]);
        assert_eq!(registry.default_server().unwrap().name(), "b");
    }

    #[test]
    fn duplicate_name_returns_existing_instance() {
        let registry = ServerRegistry::new();
        let first = registry.add("ebay", NamedServer::shared("ebay"));
        let second = registry.add("ebay", NamedServer::shared("ebay"));

        assert!(same_server(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_instance_under_new_name_returns_existing() {
        let registry = ServerRegistry::new();
        let server = NamedServer::shared("ebay");
        registry.add("ebay", Arc::clone(&server));
        let again = registry.add("ebay-alias", Arc::clone(&server));

        assert!(same_server(&server, &again));
        assert_eq!(registry.names(), ["ebay"]);
    }

    #[test]
    fn empty_registry_has_no_default() {
        let registry = ServerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.default_server().is_none());
        assert!(registry.by_name("ebay").is_none());
    }

    #[test]
    fn surfaces_reflect_every_server_added_since_last_call() {
        let registry = ServerRegistry::new();
        assert!(registry.configuration_surfaces().is_empty());

        registry.add_server(NamedServer::shared("ebay"));
        registry.add_server(NamedServer::shared("yahoo"));

        let servers: Vec<String> = registry
            .configuration_surfaces()
            .into_iter()
            .map(|surface| surface.server)
            .collect();
        assert_eq!(servers, ["ebay", "yahoo"]);
    }

    #[test]
    fn surfaces_are_built_outside_the_lock() {
        let registry = Arc::new(ServerRegistry::new());
        registry.add_server(NamedServer::shared("ebay"));
        registry.add_server(Arc::new(Introspecting {
            registry: Arc::downgrade(&registry),
        }));

        // would deadlock if the registry lock were still held
        let surfaces = registry.configuration_surfaces();
        assert_eq!(surfaces[1].title, "2 servers");
    }

    struct Introspecting {
        registry: std::sync::Weak<ServerRegistry>,
    }

    #[async_trait]
    impl AuctionServer for Introspecting {
        fn name(&self) -> &str {
            "introspecting"
        }
        fn check_if_identifier_is_handled(&self, _identifier: &str) -> bool {
            false
        }
        fn handles_site(&self, _url: &Url) -> bool {
            false
        }
        async fn reload_time_now(&self) -> crate::Result<()> {
            Ok(())
        }
        fn official_server_time_delta(&self) -> chrono::TimeDelta {
            chrono::TimeDelta::zero()
        }
        fn time(&self) -> String {
            String::new()
        }
        fn auction_count(&self) -> usize {
            0
        }
        fn to_config_tree(&self) -> ConfigNode {
            ConfigNode::new("server")
        }
        fn from_config_tree(&self, _node: &ConfigNode) -> crate::Result<()> {
            Ok(())
        }
        fn configuration_surface(&self) -> ConfigSurface {
            let count = self.registry.upgrade().map_or(0, |registry| {
                registry.add_server(NamedServer::shared("ebay"));
                registry.len()
            });
            ConfigSurface::new(self.name(), format!("{} servers", count))
        }
    }
}
