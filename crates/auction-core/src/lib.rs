// # auction-core
//
// Registry and dispatch manager for pluggable auction servers.
//
// Each auction server represents one external auction site. The core keeps
// the ordered set of active servers, resolves which server owns a given
// identifier or URL, builds servers by name from persisted configuration,
// and serializes time-synchronization requests that arrive over the
// message bus.
//
// ## Architecture Overview
//
// - **AuctionServer**: Trait implemented by every site integration
// - **ServerRegistry**: Ordered, name-unique collection of active servers
// - **ServerFactories**: Explicit name → factory table used during loading
// - **ServerLoader**: Populates the registry from a configuration tree
// - **DispatchResolver**: First-match lookup by identifier or URL
// - **TimeSyncCoordinator**: Bus listener that collapses TIMECHECK bursts
// - **AuctionServerManager**: Composition root owning all of the above
//
// ## Design Principles
//
// 1. **No hidden globals**: The registry is owned by the composition root
//    and shared by `Arc`
// 2. **Idempotent registration**: Adding a server twice is a no-op
// 3. **Plugin-Based**: Servers are built from registered factories, never
//    from late-bound type names
// 4. **Absence is normal**: Resolution misses are `None`, not errors

pub mod traits;
pub mod config;
pub mod registry;
pub mod loader;
pub mod resolver;
pub mod timesync;
pub mod bus;
pub mod entries;
pub mod manager;
pub mod error;

// Re-export core types for convenience
pub use traits::{AuctionServer, AuctionServerFactory, EntryStore, MessageListener, MessageQueue, SearchManager};
pub use config::{ConfigFile, ConfigNode, DrainPolicy, ManagerConfig, TimeSyncConfig};
pub use registry::{ServerFactories, ServerRegistry};
pub use loader::ServerLoader;
pub use resolver::DispatchResolver;
pub use timesync::TimeSyncCoordinator;
pub use bus::{MemoryMessageQueue, MessageBus, Subscription};
pub use entries::MemoryEntryStore;
pub use manager::AuctionServerManager;
pub use error::{Error, Result};
