//! Agent registry record and its hash-field mapping.

use super::{AgentId, AgentStatus, AgentType};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const FIELD_AGENT_ID: &str = "agent_id";
const FIELD_AGENT_TYPE: &str = "agent_type";
const FIELD_STATUS: &str = "status";
const FIELD_LAST_HEARTBEAT: &str = "last_heartbeat";
const FIELD_CAPABILITIES: &str = "capabilities";

/// Registry entry for a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    agent_id: AgentId,
    agent_type: AgentType,
    status: AgentStatus,
    last_heartbeat: DateTime<Utc>,
    capabilities: Vec<String>,
}

impl AgentRecord {
    /// Creates an online record stamped at `now`.
    #[must_use]
    pub const fn online(
        agent_id: AgentId,
        agent_type: AgentType,
        capabilities: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_id,
            agent_type,
            status: AgentStatus::Online,
            last_heartbeat: now,
            capabilities,
        }
    }

    /// Returns the type named by a stored hash, without validating the rest.
    #[must_use]
    pub fn stored_type(fields: &HashMap<String, String>) -> Option<&str> {
        fields.get(FIELD_AGENT_TYPE).map(String::as_str)
    }

    /// Rebuilds a record from its stored hash fields.
    ///
    /// A record whose heartbeat is older than `stale_after` reads as
    /// [`AgentStatus::Offline`] regardless of the stored status.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing or malformed field.
    pub fn from_fields(
        fields: &HashMap<String, String>,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<Self, String> {
        let field = |name: &str| {
            fields
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| format!("missing field {name}"))
        };

        let agent_id = AgentId::new(field(FIELD_AGENT_ID)?)
            .map_err(|err| err.to_string())?;
        let agent_type = AgentType::new(field(FIELD_AGENT_TYPE)?)
            .map_err(|err| err.to_string())?;
        let stored_status = AgentStatus::try_from(field(FIELD_STATUS)?)
            .map_err(|err| err.to_string())?;
        let last_heartbeat = DateTime::parse_from_rfc3339(field(FIELD_LAST_HEARTBEAT)?)
            .map_err(|err| format!("invalid last_heartbeat: {err}"))?
            .with_timezone(&Utc);
        let capabilities = match fields.get(FIELD_CAPABILITIES) {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|err| format!("invalid capabilities: {err}"))?,
            None => Vec::new(),
        };

        let stale_window = TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::MAX);
        let is_stale = now.signed_duration_since(last_heartbeat) > stale_window;
        let status = if is_stale {
            AgentStatus::Offline
        } else {
            stored_status
        };

        Ok(Self {
            agent_id,
            agent_type,
            status,
            last_heartbeat,
            capabilities,
        })
    }

    /// Returns the hash fields that persist this record.
    #[must_use]
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (FIELD_AGENT_ID, self.agent_id.to_string()),
            (FIELD_AGENT_TYPE, self.agent_type.to_string()),
            (FIELD_STATUS, self.status.as_str().to_owned()),
            (FIELD_LAST_HEARTBEAT, self.last_heartbeat.to_rfc3339()),
            (
                FIELD_CAPABILITIES,
                serde_json::to_string(&self.capabilities)
                    .unwrap_or_else(|_| "[]".to_owned()),
            ),
        ]
    }

    /// Returns the liveness fields rewritten by a heartbeat.
    #[must_use]
    pub fn heartbeat_fields(
        status: AgentStatus,
        now: DateTime<Utc>,
    ) -> [(&'static str, String); 2] {
        [
            (FIELD_STATUS, status.as_str().to_owned()),
            (FIELD_LAST_HEARTBEAT, now.to_rfc3339()),
        ]
    }

    /// Returns the agent id.
    #[must_use]
    pub const fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the agent type.
    #[must_use]
    pub const fn agent_type(&self) -> &AgentType {
        &self.agent_type
    }

    /// Returns the effective liveness status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the latest heartbeat timestamp.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns `true` when the agent is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == AgentStatus::Online
    }
}
