//! Storage adapters.

pub mod memory_store;
pub mod memory_user_cache;

pub use memory_store::InMemoryPropertyStore;
pub use memory_user_cache::InMemoryUserCache;
