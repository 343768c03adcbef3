//! Service layer for agent registration, heartbeats, and discovery.
//!
//! Provides [`AgentRegistry`], which keeps each agent's record hash and its
//! membership in `agents:online` / `agents:type:{type}` in step.

use crate::agent_registry::domain::{
    AgentDomainError, AgentId, AgentRecord, AgentStatus, AgentType,
};
use crate::store::keys;
use crate::store::ports::{KeyValueStore, StoreError};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No live record exists for the agent.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
    /// A stored record could not be decoded.
    #[error("corrupt registry record for agent {agent_id}: {reason}")]
    CorruptRecord {
        /// Agent whose record is unreadable.
        agent_id: String,
        /// Decoding failure.
        reason: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Store-backed agent registry.
pub struct AgentRegistry<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    record_ttl: Duration,
}

impl<S, C> Clone for AgentRegistry<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            record_ttl: self.record_ttl,
        }
    }
}

impl<S, C> AgentRegistry<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Creates a registry whose records expire after `record_ttl` without a
    /// heartbeat.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, record_ttl: Duration) -> Self {
        Self {
            store,
            clock,
            record_ttl,
        }
    }

    /// Registers (or re-registers) an agent as online.
    ///
    /// Re-registering refreshes the record, its lifetime, and its set
    /// memberships; it never fails because the agent already exists. A new
    /// type replaces the agent's membership of its previous type's set.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Domain`] when `agent_type` is the reserved
    /// broadcast type and [`RegistryError::Store`] when a write fails.
    pub async fn register(
        &self,
        agent_id: &AgentId,
        agent_type: &AgentType,
        capabilities: Vec<String>,
    ) -> RegistryResult<AgentRecord> {
        if agent_type.is_all() {
            let reserved = AgentDomainError::ReservedAgentType(agent_type.to_string());
            return Err(reserved.into());
        }

        let record = AgentRecord::online(
            agent_id.clone(),
            agent_type.clone(),
            capabilities,
            self.clock.utc(),
        );
        let record_key = keys::agent(agent_id);
        let previous = self.store.hash_get_all(&record_key).await?;
        if let Some(previous_type) = AgentRecord::stored_type(&previous)
            && previous_type != agent_type.as_str()
        {
            self.store
                .set_remove(&keys::agents_of_type(previous_type), agent_id.as_str())
                .await?;
        }
        for (field, value) in record.to_fields() {
            self.store.hash_set(&record_key, field, &value).await?;
        }
        self.store.expire(&record_key, self.record_ttl).await?;
        self.store
            .set_add(keys::ONLINE_AGENTS, agent_id.as_str())
            .await?;
        self.store
            .set_add(&keys::agents_of_type(agent_type), agent_id.as_str())
            .await?;

        tracing::debug!(agent_id = %agent_id, agent_type = %agent_type, "agent registered");
        Ok(record)
    }

    /// Records a heartbeat, updating status and `last_heartbeat` and
    /// refreshing the record lifetime.
    ///
    /// An `Offline` heartbeat removes the agent from `agents:online`; an
    /// `Online` one restores it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AgentNotFound`] when the record has expired
    /// or was never created, and [`RegistryError::Store`] on store failure.
    pub async fn heartbeat(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> RegistryResult<AgentRecord> {
        let record_key = keys::agent(agent_id);
        if self.store.hash_get_all(&record_key).await?.is_empty() {
            return Err(RegistryError::AgentNotFound(agent_id.clone()));
        }

        for (field, value) in AgentRecord::heartbeat_fields(status, self.clock.utc()) {
            self.store.hash_set(&record_key, field, &value).await?;
        }
        self.store.expire(&record_key, self.record_ttl).await?;
        match status {
            AgentStatus::Online => {
                self.store
                    .set_add(keys::ONLINE_AGENTS, agent_id.as_str())
                    .await?;
            }
            AgentStatus::Offline => {
                self.store
                    .set_remove(keys::ONLINE_AGENTS, agent_id.as_str())
                    .await?;
            }
        }

        self.find(agent_id)
            .await?
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.clone()))
    }

    /// Marks an agent offline and removes it from `agents:online`.
    ///
    /// The record itself is left to expire; deregistering an unknown agent
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] when a store call fails.
    pub async fn deregister(&self, agent_id: &AgentId) -> RegistryResult<()> {
        match self.heartbeat(agent_id, AgentStatus::Offline).await {
            Ok(_) => {}
            Err(RegistryError::AgentNotFound(_)) => {
                self.store
                    .set_remove(keys::ONLINE_AGENTS, agent_id.as_str())
                    .await?;
            }
            Err(err) => return Err(err),
        }
        tracing::debug!(agent_id = %agent_id, "agent deregistered");
        Ok(())
    }

    /// Looks up a single agent record.
    ///
    /// Returns `Ok(None)` when the record has expired or never existed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CorruptRecord`] when the stored hash cannot
    /// be decoded, or [`RegistryError::Store`] on store failure.
    pub async fn find(&self, agent_id: &AgentId) -> RegistryResult<Option<AgentRecord>> {
        let fields = self.store.hash_get_all(&keys::agent(agent_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        AgentRecord::from_fields(&fields, self.clock.utc(), self.record_ttl)
            .map(Some)
            .map_err(|reason| RegistryError::CorruptRecord {
                agent_id: agent_id.to_string(),
                reason,
            })
    }

    /// Lists registered agents, optionally restricted to one type.
    ///
    /// With no type (or the `all` pseudo-type) this reads `agents:online`.
    /// Members whose record has expired are skipped silently; unreadable
    /// records are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] when a store call fails.
    pub async fn discover(
        &self,
        agent_type: Option<&AgentType>,
    ) -> RegistryResult<Vec<AgentRecord>> {
        let members = self.members(agent_type).await?;
        let mut records = Vec::with_capacity(members.len());
        for member in members {
            match self.find(&member).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(RegistryError::CorruptRecord { agent_id, reason }) => {
                    tracing::warn!(
                        agent_id = %agent_id,
                        reason = %reason,
                        "skipping corrupt agent record"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }

    /// Returns the ids of agents that are currently online with a fresh
    /// heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] when a store call fails.
    pub async fn online_agents(&self) -> RegistryResult<Vec<AgentId>> {
        Ok(self
            .discover(None)
            .await?
            .into_iter()
            .filter(AgentRecord::is_online)
            .map(|record| record.agent_id().clone())
            .collect())
    }

    /// Returns raw set membership for a type (or `agents:online`), without
    /// checking record liveness.
    ///
    /// Malformed ids in the set are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] when the set cannot be read.
    pub async fn members(&self, agent_type: Option<&AgentType>) -> RegistryResult<Vec<AgentId>> {
        let set_key = match agent_type {
            Some(agent_type) if !agent_type.is_all() => keys::agents_of_type(agent_type),
            _ => keys::ONLINE_AGENTS.to_owned(),
        };
        Ok(self
            .store
            .set_members(&set_key)
            .await?
            .into_iter()
            .filter_map(|member| AgentId::new(member).ok())
            .collect())
    }
}
