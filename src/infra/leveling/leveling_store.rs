// Implementations of the LevelStore port.

// The bot runs on SQLite; the in-memory store backs the core tests.
#[cfg(test)]
pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
#[cfg(test)]
pub use in_memory::InMemoryLevelStore;
pub use sqlite_store::SqliteLevelStore;
