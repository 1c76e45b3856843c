//! Configuration loader
//!
//! Turns the children of a persisted `auctions` node into registered
//! servers:
//!
//! 1. Only children tagged `server` are considered; others are ignored
//! 2. A `server` node without a `NAME` attribute is skipped
//! 3. Unregistered names are built through [`ServerFactories`]; failure
//!    here aborts the load with [`Error::ConfigParse`]
//! 4. The server is attached to the entry store and asked to parse its
//!    own sub-tree; a parse failure is logged and loading continues
//!
//! Loading the same tree twice does not duplicate servers, because every
//! server goes through the registry's idempotent `add`.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::ConfigNode;
use crate::error::{Error, Result};
use crate::registry::{ServerFactories, ServerRegistry};
use crate::traits::EntryStore;

/// Tag of the configuration nodes that describe a server
pub const SERVER_TAG: &str = "server";

/// Attribute holding the server name
pub const NAME_ATTRIBUTE: &str = "NAME";

/// Populates a [`ServerRegistry`] from a configuration tree
#[derive(Clone)]
pub struct ServerLoader {
    registry: Arc<ServerRegistry>,
    factories: Arc<ServerFactories>,
    entry_store: Option<Arc<dyn EntryStore>>,
}

impl ServerLoader {
    /// Create a loader that registers into `registry`
    pub fn new(registry: Arc<ServerRegistry>, factories: Arc<ServerFactories>) -> Self {
        Self {
            registry,
            factories,
            entry_store: None,
        }
    }

    /// Attach every loaded server to this entry store
    pub fn with_entry_store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.entry_store = Some(store);
        self
    }

    /// Load all `server` children of `root`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every resolvable server node was processed
    /// - `Err(Error::ConfigParse)`: A server could not be built; nodes
    ///   after it were not processed
    pub fn load(&self, root: &ConfigNode) -> Result<()> {
        for node in root.children() {
            if node.tag() != SERVER_TAG {
                continue;
            }

            let Some(name) = node.property(NAME_ATTRIBUTE) else {
                debug!("Skipping <{}> node without {} attribute", node.tag(), NAME_ATTRIBUTE);
                continue;
            };

            let server = match self.registry.by_name(name) {
                Some(existing) => existing,
                None => {
                    let created = self.factories.create(name).map_err(|e| {
                        let message = match &e {
                            Error::UnknownServer(_) => {
                                format!("Failed to load controller for server {}.", name)
                            }
                            _ => format!("Failed to instantiate server for {}.", name),
                        };
                        error!(error = %e, "{}", message);
                        Error::config_parse(node.tag(), message)
                    })?;
                    self.registry.add(name, created)
                }
            };

            if let Some(store) = &self.entry_store {
                server.set_entry_store(Arc::clone(store));
            }

            if let Err(e) = server.from_config_tree(node) {
                error!(server = name, error = %e, "Parse exception");
                continue;
            }

            info!("Loaded configuration for server {}", name);
        }

        Ok(())
    }
}

impl std::fmt::Debug for ServerLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerLoader")
            .field("registry", &self.registry)
            .field("factories", &self.factories)
            .field("entry_store", &self.entry_store.is_some())
            .finish()
    }
}
