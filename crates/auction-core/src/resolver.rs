//! First-match server resolution
//!
//! Both lookups walk the registry in insertion order and return the first
//! server that claims the input. The winner is passed back through the
//! registry's idempotent `add`, so resolution never changes the set of
//! registered servers.

use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::Result;
use crate::registry::ServerRegistry;
use crate::traits::AuctionServer;

/// Resolves identifiers and URLs to the server that handles them
#[derive(Debug, Clone)]
pub struct DispatchResolver {
    registry: Arc<ServerRegistry>,
}

impl DispatchResolver {
    /// Create a resolver over `registry`
    pub fn new(registry: Arc<ServerRegistry>) -> Self {
        Self { registry }
    }

    /// Find the server that owns a bare identifier (e.g. a pasted auction number)
    ///
    /// # Returns
    ///
    /// The first server whose `check_if_identifier_is_handled` returns
    /// `true`, or `None` if no server claims it.
    pub fn resolve_by_identifier(&self, identifier: &str) -> Option<Arc<dyn AuctionServer>> {
        self.first_match(|server| server.check_if_identifier_is_handled(identifier))
    }

    /// Find the server that handles a site URL
    ///
    /// # Returns
    ///
    /// - `Ok(Some(server))`: First server whose `handles_site` returns `true`
    /// - `Ok(None)`: No server handles this URL
    /// - `Err(Error::InvalidUrl)`: `url` does not parse
    pub fn resolve_by_url(&self, url: &str) -> Result<Option<Arc<dyn AuctionServer>>> {
        let parsed = Url::parse(url)?;

        let found = self.first_match(|server| server.handles_site(&parsed));
        if found.is_none() {
            debug!("No matches for resolve_by_url({})", url);
        }

        Ok(found)
    }

    // Predicates run against a snapshot, without the registry lock held.
    fn first_match<F>(&self, mut claims: F) -> Option<Arc<dyn AuctionServer>>
    where
        F: FnMut(&dyn AuctionServer) -> bool,
    {
        self.registry
            .all()
            .into_iter()
            .find(|server| claims(server.as_ref()))
            .map(|server| self.registry.add_server(server))
    }
}
