//! Message type tags.

use super::ParseMessageTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of message, used to route it to registered handlers.
///
/// Serialized as its snake-case tag so stored payloads stay readable by
/// external tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A request to perform work.
    TaskRequest,
    /// The result of a previous task request.
    TaskResponse,
    /// A progress or state report.
    StatusUpdate,
    /// Data handed from one agent to another.
    DataShare,
    /// Coordination between agents.
    Coordination,
    /// An error report.
    Error,
    /// A liveness announcement.
    Heartbeat,
    /// An agent announcing or querying presence.
    AgentDiscovery,
    /// Shared state synchronisation.
    StateSync,
}

impl MessageType {
    /// Every message type, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::TaskRequest,
        Self::TaskResponse,
        Self::StatusUpdate,
        Self::DataShare,
        Self::Coordination,
        Self::Error,
        Self::Heartbeat,
        Self::AgentDiscovery,
        Self::StateSync,
    ];

    /// Returns the wire tag for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskRequest => "task_request",
            Self::TaskResponse => "task_response",
            Self::StatusUpdate => "status_update",
            Self::DataShare => "data_share",
            Self::Coordination => "coordination",
            Self::Error => "error",
            Self::Heartbeat => "heartbeat",
            Self::AgentDiscovery => "agent_discovery",
            Self::StateSync => "state_sync",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessageType {
    type Error = ParseMessageTypeError;

    fn try_from(value: &str) -> Result<Self, ParseMessageTypeError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ParseMessageTypeError(value.to_owned()))
    }
}
