//! Name → factory table for auction servers
//!
//! Persisted configuration names servers by string. Rather than resolving
//! those strings to types at runtime, every known server registers a
//! factory here during startup, and unknown names are rejected.
//!
//! ## Registration
//!
//! Server crates should register themselves during initialization:
//!
//! ```rust,ignore
//! # use auction_core::ServerFactories;
//! // In an auction-server-ebay crate
//! pub fn register(factories: &ServerFactories) {
//!     factories.register("ebay", || Ok(Arc::new(EbayServer::default()) as Arc<dyn AuctionServer>));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::traits::{AuctionServer, AuctionServerFactory};

/// Factory table for plugin-based server creation
///
/// ## Thread Safety
///
/// The table uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ServerFactories {
    factories: RwLock<HashMap<String, Arc<dyn AuctionServerFactory>>>,
}

impl ServerFactories {
    /// Create a new empty factory table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server factory
    ///
    /// # Parameters
    ///
    /// - `name`: Server name as it appears in `NAME` attributes (e.g., "ebay")
    /// - `factory`: Factory for creating fresh instances
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register(&self, name: impl Into<String>, factory: impl AuctionServerFactory + 'static) {
        let name = name.into();
        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        factories.insert(name, Arc::new(factory));
    }

    /// Build a new server instance by name
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn AuctionServer>)`: Freshly created server
    /// - `Err(Error::UnknownServer)`: If no factory is registered for `name`
    /// - `Err(Error::Construction)`: If the factory failed
    pub fn create(&self, name: &str) -> Result<Arc<dyn AuctionServer>> {
        let factory = {
            let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
            factories
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnknownServer(name.to_string()))?
        };

        // Release the lock before running the factory
        factory.create().map_err(|e| match e {
            Error::Construction { .. } => e,
            other => Error::construction(name, other.to_string()),
        })
    }

    /// List all registered server names
    pub fn list(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a factory is registered for `name`
    pub fn contains(&self, name: &str) -> bool {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        factories.contains_key(name)
    }
}

impl std::fmt::Debug for ServerFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerFactories")
            .field("names", &self.list())
            .finish()
    }
}
