// Store implementations (data access layer)
// Adapters that implement the domain storage contract

pub mod in_memory_store;
pub mod postgres_store;
mod sql;

pub use in_memory_store::{InMemorySession, InMemoryStore};
pub use postgres_store::{PostgresSession, PostgresStore};
