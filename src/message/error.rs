//! Error types for message store operations.

use super::domain::MessageId;
use crate::store::ports::StoreError;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`super::services::MessageStore`].
#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A message could not be encoded or a stored payload could not be
    /// decoded.
    #[error("message serialization failed: {0}")]
    Serialization(Arc<serde_json::Error>),

    /// The message no longer exists in the store.
    #[error("message not found: {0}")]
    NotFound(MessageId),
}

impl MessageStoreError {
    /// Returns `true` when the store could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_unavailable())
    }
}

impl From<serde_json::Error> for MessageStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

/// Result type for message store operations.
pub type MessageStoreResult<T> = Result<T, MessageStoreError>;
