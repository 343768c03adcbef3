//! Error types for agent domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing agent domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent id is empty after trimming.
    #[error("agent id must not be empty")]
    EmptyAgentId,

    /// The agent id contains whitespace or control characters.
    #[error("agent id '{0}' contains whitespace or control characters")]
    InvalidAgentId(String),

    /// The agent id exceeds the length limit.
    #[error("agent id exceeds 128 character limit: {0}")]
    AgentIdTooLong(String),

    /// The agent type is empty after trimming.
    #[error("agent type must not be empty")]
    EmptyAgentType,

    /// The agent type contains characters outside `[a-z0-9_-]`.
    #[error("agent type '{0}' contains invalid characters")]
    InvalidAgentType(String),

    /// The agent type is reserved for broadcast addressing.
    #[error("agent type '{0}' is reserved")]
    ReservedAgentType(String),
}

/// Error returned while parsing agent status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
