// # Search Manager Trait
//
// Sink that servers push their predefined searches into.

/// Receives searches contributed by auction servers
pub trait SearchManager: Send + Sync {
    /// Register a search on behalf of `server`
    fn add_search(&self, server: &str, label: &str, query: &str);
}
