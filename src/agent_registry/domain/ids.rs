//! Identifier types for the agent domain.

use super::AgentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_AGENT_ID_LENGTH: usize = 128;
const BROADCAST_ALL: &str = "all";

/// Unique, caller-chosen agent identifier (for example `analyst-1`).
///
/// Ids are used verbatim inside store keys, so whitespace and control
/// characters are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates a validated agent id.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyAgentId`] when the value is blank,
    /// [`AgentDomainError::InvalidAgentId`] when it contains whitespace or
    /// control characters, or [`AgentDomainError::AgentIdTooLong`] when it
    /// exceeds 128 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(AgentDomainError::EmptyAgentId);
        }
        if trimmed.chars().count() > MAX_AGENT_ID_LENGTH {
            return Err(AgentDomainError::AgentIdTooLong(raw));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(AgentDomainError::InvalidAgentId(raw));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Agent class used for discovery and broadcast (for example `pm`).
///
/// Normalized to lowercase. The value `all` addresses every online agent
/// and cannot be registered as a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentType(String);

impl AgentType {
    /// Creates a validated agent type.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyAgentType`] when the value is blank
    /// or [`AgentDomainError::InvalidAgentType`] when it contains characters
    /// outside `[a-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(AgentDomainError::EmptyAgentType);
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
        if !is_valid {
            return Err(AgentDomainError::InvalidAgentType(raw));
        }

        Ok(Self(normalized))
    }

    /// The broadcast pseudo-type addressing every online agent.
    #[must_use]
    pub fn all() -> Self {
        Self(BROADCAST_ALL.to_owned())
    }

    /// Returns `true` for the broadcast pseudo-type.
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0 == BROADCAST_ALL
    }

    /// Returns the type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
