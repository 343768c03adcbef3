//! Key/value store port with list, set, and hash primitives.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or has already expired).
    Missing,
    /// The key exists without an expiry.
    Persistent,
    /// The key expires after the given duration.
    Remaining(Duration),
}

/// Store contract modelled on the Redis command set.
///
/// Implementations must provide per-element idempotence for
/// [`list_remove`](Self::list_remove) and [`set_remove`](Self::set_remove),
/// since several processes may drain the same queue concurrently. Reads of
/// expired keys behave exactly like reads of absent keys.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stores a string value, replacing any previous value and expiry.
    ///
    /// `None` stores the key without an expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Reads a string value.
    ///
    /// Returns `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Deletes a key of any type. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Sets the expiry of an existing key.
    ///
    /// Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Reports the remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// Pushes a value onto the head of a list, creating it if needed.
    async fn list_push(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Returns list elements between `start` and `stop` inclusive.
    ///
    /// Negative indices count from the tail (`-1` is the last element).
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Removes every occurrence of `value` from a list.
    async fn list_remove(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Adds a member to a set.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Removes a member from a set.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Returns all members of a set, or an empty list for an absent key.
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Sets one field of a hash.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Returns every field of a hash, or an empty map for an absent key.
    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>>;

    /// Round-trips to the store to prove connectivity.
    async fn ping(&self) -> StoreResult<()>;
}

/// Errors returned by store adapters.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// A store call did not complete within the configured bound.
    #[error("store operation {operation} timed out after {timeout:?}")]
    Timeout {
        /// Command that timed out.
        operation: &'static str,
        /// Configured bound.
        timeout: Duration,
    },

    /// The store rejected or failed a command.
    #[error("store command failed: {0}")]
    Command(Arc<dyn std::error::Error + Send + Sync>),

    /// The key holds a value of a different type than the command expects.
    #[error("key {key} holds a value of the wrong type")]
    WrongType {
        /// Offending key.
        key: String,
    },
}

impl StoreError {
    /// Wraps a connectivity failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps a command failure.
    pub fn command(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Command(Arc::new(err))
    }

    /// Creates a wrong-type error for `key`.
    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    /// Returns `true` when the store could not be reached at all, as opposed
    /// to a command that reached it and failed.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}
