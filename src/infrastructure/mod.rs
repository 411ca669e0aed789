// SQLite persistence (read side of the outcome store)
pub mod persistence;

// In-memory repository implementations
pub mod repositories;

pub use repositories::InMemoryOutcomeRepository;
