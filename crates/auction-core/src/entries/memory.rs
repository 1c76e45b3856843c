// # Memory Entry Store
//
// In-memory implementation of EntryStore.
//
// Entries are kept in a HashMap keyed by identifier and are lost on
// restart. Useful for tests and for hosts that persist entries elsewhere.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::entry_store::{AuctionEntry, EntryStore};

/// In-memory entry store
///
/// # Example
///
/// ```rust,no_run
/// use auction_core::entries::MemoryEntryStore;
/// use auction_core::traits::{AuctionEntry, EntryStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryEntryStore::new();
///     store.put_entry(AuctionEntry::new("123").with_server("ebay")).await?;
///
///     let entry = store.get_entry("123").await?;
///     assert_eq!(entry.and_then(|e| e.server).as_deref(), Some("ebay"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    inner: Arc<RwLock<HashMap<String, AuctionEntry>>>,
}

impl MemoryEntryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn get_entry(&self, identifier: &str) -> Result<Option<AuctionEntry>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(identifier).cloned())
    }

    async fn put_entry(&self, entry: AuctionEntry) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(entry.identifier.clone(), entry);
        Ok(())
    }

    async fn remove_entry(&self, identifier: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(identifier);
        Ok(())
    }

    async fn list_entries(&self) -> Result<Vec<AuctionEntry>, Error> {
        let guard = self.inner.read().await;
        let mut entries: Vec<AuctionEntry> = guard.values().cloned().collect();
        entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_remove() {
        let store = MemoryEntryStore::new();
        assert!(store.is_empty().await);

        store
            .put_entry(AuctionEntry::new("123").with_server("ebay").with_title("Lamp"))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        let entry = store.get_entry("123").await.unwrap().unwrap();
        assert_eq!(entry.title, "Lamp");

        store.remove_entry("123").await.unwrap();
        assert!(store.get_entry("123").await.unwrap().is_none());

        // removing again is fine
        store.remove_entry("123").await.unwrap();
    }

    #[tokio::test]
    async fn put_replaces_by_identifier() {
        let store = MemoryEntryStore::new();
        store.put_entry(AuctionEntry::new("1").with_title("old")).await.unwrap();
        store.put_entry(AuctionEntry::new("1").with_title("new")).await.unwrap();

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "new");
    }
}
