//! Port contract for the key/value store.
//!
//! Services depend only on this trait so tests can substitute the in-memory
//! adapter (or a mock) for a live Redis connection.

pub mod store;

#[cfg(test)]
pub use store::MockKeyValueStore;
pub use store::{KeyTtl, KeyValueStore, StoreError, StoreResult};
