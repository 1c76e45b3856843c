// # Entry Store Trait
//
// The persisted store of auction entries that servers are attached to
// during configuration load.
//
// ## Implementations
//
// - In-memory: `crate::entries::MemoryEntryStore`

use async_trait::async_trait;

/// One tracked auction
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuctionEntry {
    /// Site-specific auction identifier
    pub identifier: String,
    /// Name of the server that owns this auction, if known
    pub server: Option<String>,
    /// Listing title
    #[serde(default)]
    pub title: String,
}

impl AuctionEntry {
    /// Create an entry with no owning server
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            server: None,
            title: String::new(),
        }
    }

    /// Set the owning server name
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Set the listing title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Trait for auction entry stores
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Look up an entry by identifier
    async fn get_entry(&self, identifier: &str) -> Result<Option<AuctionEntry>, crate::Error>;

    /// Insert or replace an entry
    async fn put_entry(&self, entry: AuctionEntry) -> Result<(), crate::Error>;

    /// Remove an entry; removing a missing entry is not an error
    async fn remove_entry(&self, identifier: &str) -> Result<(), crate::Error>;

    /// All stored entries, in no particular order
    async fn list_entries(&self) -> Result<Vec<AuctionEntry>, crate::Error>;
}
