//! Error types for the messaging facade.

use crate::agent_registry::services::RegistryError;
use crate::message::error::MessageStoreError;
use crate::store::ports::StoreError;
use thiserror::Error;

/// Errors returned by [`super::hub::MessagingHub`] and
/// [`super::processor::MessageProcessor`].
#[derive(Debug, Error)]
pub enum MessagingError {
    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A message store operation failed.
    #[error(transparent)]
    MessageStore(#[from] MessageStoreError),

    /// The store client failed directly.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `start` was called on a processor that is already running.
    #[error("message processor is already running")]
    ProcessorAlreadyRunning,

    /// `stop` was called on a processor that is not running.
    #[error("message processor is not running")]
    ProcessorNotRunning,
}

impl MessagingError {
    /// Returns `true` when the underlying store could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        match self {
            Self::Registry(RegistryError::Store(err)) | Self::Store(err) => err.is_unavailable(),
            Self::MessageStore(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

/// Result type for messaging operations.
pub type MessagingResult<T> = Result<T, MessagingError>;
