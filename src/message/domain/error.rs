//! Error types for message domain parsing.

use thiserror::Error;

/// Error returned while parsing a message type tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message type: {0}")]
pub struct ParseMessageTypeError(pub String);

/// Error returned while parsing a message priority tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message priority: {0}")]
pub struct ParseMessagePriorityError(pub String);
