// # Auction Server Trait
//
// Defines the capabilities the manager needs from each auction site
// integration.
//
// ## Implementations
//
// Site integrations live outside this crate and register a factory with
// `ServerFactories` under the name used in the persisted configuration.
//
// ## Usage
//
// ```rust,ignore
// use auction_core::{AuctionServer, ServerFactories};
// use std::sync::Arc;
//
// let factories = ServerFactories::new();
// factories.register("ebay", || Ok(Arc::new(EbayServer::default()) as Arc<dyn AuctionServer>));
// ```

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::config::ConfigNode;
use crate::traits::entry_store::{AuctionEntry, EntryStore};
use crate::traits::search::SearchManager;

/// Opaque configuration handle a server exposes for UI construction
///
/// The manager only collects these; it never looks inside `settings`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSurface {
    /// Name of the server that owns this surface
    pub server: String,
    /// Display title
    pub title: String,
    /// Server-defined settings payload
    pub settings: serde_json::Value,
}

impl ConfigSurface {
    /// Create a surface with an empty settings payload
    pub fn new(server: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            title: title.into(),
            settings: serde_json::Value::Null,
        }
    }
}

/// Trait for auction site integrations
///
/// # Thread Safety
///
/// Servers are shared as `Arc<dyn AuctionServer>` between the registry,
/// the resolver and the time-sync coordinator, so every method takes
/// `&self`. Implementations keep their mutable state behind their own
/// locks.
///
/// # Ownership
///
/// A server instance belongs to exactly one registry entry. The registry
/// never inspects server state beyond the calls below.
#[async_trait]
pub trait AuctionServer: Send + Sync {
    /// Unique human-readable name, used as the registry key
    fn name(&self) -> &str;

    /// Does this server own the given opaque identifier?
    ///
    /// Used for pasted auction numbers that carry no site information.
    fn check_if_identifier_is_handled(&self, identifier: &str) -> bool;

    /// Does this server handle the given site URL?
    fn handles_site(&self, url: &Url) -> bool;

    /// Refresh the authoritative time offset from the remote site
    ///
    /// This is network-bound. Callers must not hold the registry lock
    /// while awaiting it.
    async fn reload_time_now(&self) -> Result<(), crate::Error>;

    /// Offset between the site's official clock and the local clock
    fn official_server_time_delta(&self) -> chrono::TimeDelta;

    /// Human-readable current site time
    fn time(&self) -> String;

    /// Number of auctions currently registered with this server
    fn auction_count(&self) -> usize;

    /// Serialize this server's own configuration sub-tree
    ///
    /// The returned node should be tagged `server` and carry a `NAME`
    /// attribute so that it can be loaded back.
    fn to_config_tree(&self) -> ConfigNode;

    /// Restore this server's state from its configuration sub-tree
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Sub-tree accepted
    /// - `Err(Error::ServerParse)`: Sub-tree malformed; state may be partial
    fn from_config_tree(&self, node: &ConfigNode) -> Result<(), crate::Error>;

    /// Configuration handle for external UI construction
    fn configuration_surface(&self) -> ConfigSurface;

    /// Install this server's menu entries
    fn establish_menu(&self) {}

    /// Register this server's predefined searches
    fn add_searches(&self, _searches: &dyn SearchManager) {}

    /// Cancel any searches this server registered
    fn cancel_searches(&self) {}

    /// Attach the shared auction-entry store
    fn set_entry_store(&self, _store: Arc<dyn EntryStore>) {}

    /// Start tracking an auction entry
    fn register_auction(&self, _entry: &AuctionEntry) {}

    /// Stop tracking an auction entry
    fn unregister_auction(&self, _entry: &AuctionEntry) {}
}

/// Builds a fresh, unconfigured server instance
///
/// Registered in [`ServerFactories`](crate::registry::ServerFactories)
/// under the name that appears in the `NAME` attribute of persisted
/// `server` nodes.
pub trait AuctionServerFactory: Send + Sync {
    /// Create a default server instance
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn AuctionServer>)`: New server
    /// - `Err(Error)`: If construction failed
    fn create(&self) -> Result<Arc<dyn AuctionServer>, crate::Error>;
}

impl<F> AuctionServerFactory for F
where
    F: Fn() -> Result<Arc<dyn AuctionServer>, crate::Error> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn AuctionServer>, crate::Error> {
        self()
    }
}

/// Identity comparison for shared servers
///
/// Compares data pointers only, so two `Arc`s to the same instance are
/// equal even if they were coerced through different vtables.
pub fn same_server(a: &Arc<dyn AuctionServer>, b: &Arc<dyn AuctionServer>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
