// # Entry Store Implementations

pub mod memory;

pub use memory::MemoryEntryStore;
