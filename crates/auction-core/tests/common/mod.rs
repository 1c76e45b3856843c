//! Test doubles and common utilities for contract tests
//!
//! The doubles implement just enough server behaviour to observe how the
//! manager calls them.

#![allow(dead_code)]

use auction_core::config::ConfigNode;
use auction_core::error::{Error, Result};
use auction_core::traits::{AuctionEntry, AuctionServer, ConfigSurface, EntryStore, SearchManager};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A server that claims identifiers by prefix and sites by host
pub struct MockServer {
    name: String,
    prefix: Mutex<String>,
    host: Mutex<String>,
    delta: chrono::TimeDelta,
    reload_delay: Duration,
    fail_reload: bool,
    reload_calls: AtomicUsize,
    menu_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    parse_calls: AtomicUsize,
    entry_store_attached: AtomicBool,
    auctions: Mutex<Vec<String>>,
}

impl MockServer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: Mutex::new(String::new()),
            host: Mutex::new(format!("{}.example.com", name)),
            delta: chrono::TimeDelta::zero(),
            reload_delay: Duration::ZERO,
            fail_reload: false,
            reload_calls: AtomicUsize::new(0),
            menu_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            parse_calls: AtomicUsize::new(0),
            entry_store_attached: AtomicBool::new(false),
            auctions: Mutex::new(Vec::new()),
        }
    }

    /// Claim identifiers starting with `prefix`
    pub fn claiming(self, prefix: &str) -> Self {
        *self.prefix.lock().unwrap() = prefix.to_string();
        self
    }

    /// Handle URLs whose host is `host`
    pub fn on_host(self, host: &str) -> Self {
        *self.host.lock().unwrap() = host.to_string();
        self
    }

    pub fn with_delta(mut self, delta: chrono::TimeDelta) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn failing_reload(mut self) -> Self {
        self.fail_reload = true;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn reload_calls(&self) -> usize {
        self.reload_calls.load(Ordering::SeqCst)
    }

    pub fn menu_calls(&self) -> usize {
        self.menu_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn entry_store_attached(&self) -> bool {
        self.entry_store_attached.load(Ordering::SeqCst)
    }

    pub fn prefix(&self) -> String {
        self.prefix.lock().unwrap().clone()
    }

    pub fn auctions(&self) -> Vec<String> {
        self.auctions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuctionServer for MockServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_if_identifier_is_handled(&self, identifier: &str) -> bool {
        let prefix = self.prefix.lock().unwrap();
        !prefix.is_empty() && identifier.starts_with(prefix.as_str())
    }

    fn handles_site(&self, url: &Url) -> bool {
        url.host_str() == Some(self.host.lock().unwrap().as_str())
    }

    async fn reload_time_now(&self) -> Result<()> {
        self.reload_calls.fetch_add(1, Ordering::SeqCst);
        if !self.reload_delay.is_zero() {
            tokio::time::sleep(self.reload_delay).await;
        }
        if self.fail_reload {
            return Err(Error::provider(self.name.clone(), "time server unreachable"));
        }
        Ok(())
    }

    fn official_server_time_delta(&self) -> chrono::TimeDelta {
        self.delta
    }

    fn time(&self) -> String {
        format!("{} time", self.name)
    }

    fn auction_count(&self) -> usize {
        self.auctions.lock().unwrap().len()
    }

    fn to_config_tree(&self) -> ConfigNode {
        ConfigNode::new("server")
            .with_property("NAME", self.name.clone())
            .with_property("prefix", self.prefix())
    }

    fn from_config_tree(&self, node: &ConfigNode) -> Result<()> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        if node.property("malformed").is_some() {
            return Err(Error::server_parse(self.name.clone(), "malformed attribute present"));
        }
        if let Some(prefix) = node.property("prefix") {
            *self.prefix.lock().unwrap() = prefix.to_string();
        }
        Ok(())
    }

    fn configuration_surface(&self) -> ConfigSurface {
        ConfigSurface::new(self.name.clone(), format!("{} settings", self.name))
    }

    fn establish_menu(&self) {
        self.menu_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn add_searches(&self, searches: &dyn SearchManager) {
        searches.add_search(&self.name, "My Items", &format!("{}:watching", self.name));
    }

    fn cancel_searches(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn set_entry_store(&self, _store: Arc<dyn EntryStore>) {
        self.entry_store_attached.store(true, Ordering::SeqCst);
    }

    fn register_auction(&self, entry: &AuctionEntry) {
        self.auctions.lock().unwrap().push(entry.identifier.clone());
    }

    fn unregister_auction(&self, entry: &AuctionEntry) {
        self.auctions.lock().unwrap().retain(|id| id != &entry.identifier);
    }
}

/// Collects searches pushed by servers
#[derive(Default)]
pub struct MockSearchManager {
    pub searches: Mutex<Vec<(String, String, String)>>,
}

impl SearchManager for MockSearchManager {
    fn add_search(&self, server: &str, label: &str, query: &str) {
        self.searches
            .lock()
            .unwrap()
            .push((server.to_string(), label.to_string(), query.to_string()));
    }
}

/// A factory closure building a fresh `MockServer`, counting invocations
pub fn counting_factory(
    name: &'static str,
    calls: Arc<AtomicUsize>,
) -> impl Fn() -> Result<Arc<dyn AuctionServer>> + Send + Sync + 'static {
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockServer::new(name)) as Arc<dyn AuctionServer>)
    }
}

/// A factory closure that always fails
pub fn failing_factory() -> impl Fn() -> Result<Arc<dyn AuctionServer>> + Send + Sync + 'static {
    || Err(Error::Other("constructor panicked".to_string()))
}

/// A `server` configuration node
pub fn server_node(name: &str) -> ConfigNode {
    ConfigNode::new("server").with_property("NAME", name)
}

/// An `auctions` root holding `children`
pub fn auctions(children: Vec<ConfigNode>) -> ConfigNode {
    children
        .into_iter()
        .fold(ConfigNode::new("auctions"), |root, child| root.with_child(child))
}

/// Coerce a concrete mock to the trait object the registry stores
pub fn as_server(server: &Arc<MockServer>) -> Arc<dyn AuctionServer> {
    Arc::clone(server) as Arc<dyn AuctionServer>
}
