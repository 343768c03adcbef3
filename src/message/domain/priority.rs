//! Message priority levels.

use super::ParseMessagePriorityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery priority of a message.
///
/// Ordering follows urgency, so `Critical > High > Normal > Low`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    /// Background traffic such as heartbeats.
    Low,
    /// Regular traffic.
    #[default]
    Normal,
    /// Traffic that should be handled ahead of normal messages.
    High,
    /// Traffic that is also routed through the global critical queue.
    Critical,
}

impl MessagePriority {
    /// Returns the numeric level (`1` for low through `4` for critical).
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Returns the wire tag for this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MessagePriority {
    type Error = ParseMessagePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Self::Low),
            "normal" | "2" => Ok(Self::Normal),
            "high" | "3" => Ok(Self::High),
            "critical" | "4" => Ok(Self::Critical),
            _ => Err(ParseMessagePriorityError(value.to_owned())),
        }
    }
}
