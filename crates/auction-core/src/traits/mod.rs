//! Core traits for the auction server manager
//!
//! This module defines the interfaces of the manager's collaborators.
//!
//! - [`AuctionServer`]: One auction site integration
//! - [`MessageQueue`] / [`MessageListener`]: The topic-based message bus
//! - [`EntryStore`]: Persisted auction entries
//! - [`SearchManager`]: Sink for server-provided searches

pub mod auction_server;
pub mod message_queue;
pub mod entry_store;
pub mod search;

pub use auction_server::{AuctionServer, AuctionServerFactory, ConfigSurface, same_server};
pub use message_queue::{MessageListener, MessageQueue};
pub use entry_store::{AuctionEntry, EntryStore};
pub use search::SearchManager;
