//! Key layout shared by every process speaking the protocol.
//!
//! External tooling inspects these keys directly, so the formats are part of
//! the wire contract.

use std::fmt::Display;

/// Set of agent ids currently online.
pub const ONLINE_AGENTS: &str = "agents:online";

/// Global queue drained before any per-agent queue.
pub const CRITICAL_QUEUE: &str = "queue:critical";

/// Serialized message record: `message:{id}`.
#[must_use]
pub fn message(id: impl Display) -> String {
    format!("message:{id}")
}

/// Per-agent delivery queue of message ids: `queue:{agent_id}`.
#[must_use]
pub fn agent_queue(agent_id: impl Display) -> String {
    format!("queue:{agent_id}")
}

/// Per-agent list of ids not yet handed to handlers: `pending:{agent_id}`.
///
/// Ids leave this list once delivered, so the processing loop never rereads
/// messages that are only waiting for acknowledgement.
#[must_use]
pub fn pending_queue(agent_id: impl Display) -> String {
    format!("pending:{agent_id}")
}

/// Agent record hash: `agent:{agent_id}`.
#[must_use]
pub fn agent(agent_id: impl Display) -> String {
    format!("agent:{agent_id}")
}

/// Membership set for one agent type: `agents:type:{agent_type}`.
#[must_use]
pub fn agents_of_type(agent_type: impl Display) -> String {
    format!("agents:type:{agent_type}")
}
