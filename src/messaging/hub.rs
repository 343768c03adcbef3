//! Agent-facing messaging facade.
//!
//! [`MessagingHub`] owns one injected store client and builds the registry,
//! message store, and handler map on top of it. Every method takes `&self`
//! and is safe to call from many tasks at once; cross-process consistency
//! rests on the store's own list, set, and hash atomicity.

use crate::agent_registry::domain::{AgentId, AgentRecord, AgentStatus, AgentType};
use crate::agent_registry::services::AgentRegistry;
use crate::config::{MessagingConfig, ProcessorConfig};
use crate::message::domain::{
    Message, MessageContent, MessageDraft, MessageId, MessagePriority, MessageType,
};
use crate::message::services::MessageStore;
use crate::messaging::error::MessagingResult;
use crate::messaging::handler::{HandlerRegistry, MessageHandler};
use crate::messaging::processor::{Dispatcher, MessageProcessor};
use crate::store::adapters::RedisStore;
use crate::store::ports::KeyValueStore;
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Health summary for operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStatus {
    /// Whether the store answered a ping.
    pub connected: bool,
    /// Agents currently listed in `agents:online`.
    pub known_agents: usize,
    /// Known agents whose heartbeat is fresh.
    pub online_agents: usize,
    /// Ids waiting in the critical queue.
    pub critical_backlog: usize,
}

/// Public messaging API used by agents.
pub struct MessagingHub<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    registry: AgentRegistry<S, C>,
    messages: MessageStore<S, C>,
    handlers: HandlerRegistry,
}

impl<S, C> Clone for MessagingHub<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            registry: self.registry.clone(),
            messages: self.messages.clone(),
            handlers: self.handlers.clone(),
        }
    }
}

impl MessagingHub<RedisStore, DefaultClock> {
    /// Connects to the configured Redis server and builds a hub over it.
    ///
    /// There is no fallback: an unreachable store is an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::messaging::error::MessagingError::Store`] when the
    /// store cannot be reached.
    pub async fn connect(config: &MessagingConfig) -> MessagingResult<Self> {
        let store = RedisStore::connect(config).await?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(DefaultClock),
            config.message_ttl,
        ))
    }
}

impl<S, C> MessagingHub<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Builds a hub over an existing store client.
    ///
    /// `message_ttl` is both the default message lifetime and the window
    /// after which a silent agent reads as offline.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, message_ttl: Duration) -> Self {
        Self {
            registry: AgentRegistry::new(Arc::clone(&store), Arc::clone(&clock), message_ttl),
            messages: MessageStore::new(Arc::clone(&store), Arc::clone(&clock), message_ttl),
            handlers: HandlerRegistry::new(),
            store,
            clock,
        }
    }

    /// Returns the agent registry.
    #[must_use]
    pub const fn registry(&self) -> &AgentRegistry<S, C> {
        &self.registry
    }

    /// Returns the message store.
    #[must_use]
    pub const fn messages(&self) -> &MessageStore<S, C> {
        &self.messages
    }

    /// Registers (or refreshes) an agent as online.
    ///
    /// # Errors
    ///
    /// Returns a registry error when the type is reserved or a write fails.
    pub async fn register_agent(
        &self,
        agent_id: &AgentId,
        agent_type: &AgentType,
        capabilities: Vec<String>,
    ) -> MessagingResult<AgentRecord> {
        Ok(self
            .registry
            .register(agent_id, agent_type, capabilities)
            .await?)
    }

    /// Marks an agent offline and drops it from `agents:online`.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a store call fails.
    pub async fn deregister_agent(&self, agent_id: &AgentId) -> MessagingResult<()> {
        Ok(self.registry.deregister(agent_id).await?)
    }

    /// Sends a message and returns its id without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns a message store error when the message cannot be stored.
    pub async fn send(&self, draft: MessageDraft) -> MessagingResult<MessageId> {
        Ok(self.messages.send(draft).await?)
    }

    /// Sends a copy of a message to every agent of `agent_type` except the
    /// sender, returning every attempted id.
    ///
    /// # Errors
    ///
    /// Returns a message store error when membership cannot be read.
    pub async fn broadcast(
        &self,
        sender: &AgentId,
        agent_type: &AgentType,
        message_type: MessageType,
        priority: MessagePriority,
        content: MessageContent,
    ) -> MessagingResult<Vec<MessageId>> {
        Ok(self
            .messages
            .broadcast(sender, agent_type, message_type, priority, content)
            .await?)
    }

    /// Returns the agent's pending messages, highest priority and newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns a message store error when the queue cannot be read.
    pub async fn fetch(
        &self,
        agent_id: &AgentId,
        type_filter: Option<MessageType>,
    ) -> MessagingResult<Vec<Message>> {
        Ok(self.messages.fetch(agent_id, type_filter).await?)
    }

    /// Acknowledges a message, removing it from the agent's queue.
    ///
    /// # Errors
    ///
    /// Returns a message store error when the store fails or the payload is
    /// unreadable.
    pub async fn acknowledge(
        &self,
        message_id: MessageId,
        agent_id: &AgentId,
    ) -> MessagingResult<()> {
        Ok(self.messages.acknowledge(message_id, agent_id).await?)
    }

    /// Sends a `task_response` answering `original`.
    ///
    /// # Errors
    ///
    /// Returns a message store error when the reply cannot be stored.
    pub async fn reply(
        &self,
        original: &Message,
        sender: &AgentId,
        content: MessageContent,
    ) -> MessagingResult<MessageId> {
        Ok(self.messages.reply(original, sender, content).await?)
    }

    /// Looks up a single message.
    ///
    /// # Errors
    ///
    /// Returns a message store error when the payload is unreadable or the
    /// store fails.
    pub async fn get_message(&self, message_id: MessageId) -> MessagingResult<Option<Message>> {
        Ok(self.messages.get(message_id).await?)
    }

    /// Records a heartbeat and announces it to every online agent with a
    /// low-priority `heartbeat` broadcast.
    ///
    /// # Errors
    ///
    /// Returns a registry error when the agent is unknown or the update
    /// fails, and a message store error when the announcement fails.
    pub async fn heartbeat(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> MessagingResult<AgentRecord> {
        let record = self.registry.heartbeat(agent_id, status).await?;

        let mut content = MessageContent::new();
        content.insert("agent_id".to_owned(), json!(agent_id));
        content.insert("status".to_owned(), json!(status.as_str()));
        content.insert(
            "timestamp".to_owned(),
            json!(record.last_heartbeat().to_rfc3339()),
        );
        self.messages
            .broadcast(
                agent_id,
                &AgentType::all(),
                MessageType::Heartbeat,
                MessagePriority::Low,
                content,
            )
            .await?;
        Ok(record)
    }

    /// Lists registered agents, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns a registry error when a store call fails.
    pub async fn discover(
        &self,
        agent_type: Option<&AgentType>,
    ) -> MessagingResult<Vec<AgentRecord>> {
        Ok(self.registry.discover(agent_type).await?)
    }

    /// Adds a handler invoked by the processing loop for `message_type`.
    pub async fn register_handler(
        &self,
        message_type: MessageType,
        handler: Arc<dyn MessageHandler>,
    ) {
        self.handlers.register(message_type, handler).await;
    }

    /// Prunes expired messages from every online agent's queue and the
    /// critical queue.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn purge_expired(&self) -> MessagingResult<usize> {
        let agents = self.registry.members(None).await?;
        Ok(self.messages.purge_expired(&agents).await?)
    }

    /// Builds a processing loop sharing this hub's services and handlers.
    #[must_use]
    pub fn processor(&self, config: ProcessorConfig) -> MessageProcessor<S, C> {
        MessageProcessor::new(Dispatcher::new(
            self.registry.clone(),
            self.messages.clone(),
            self.handlers.clone(),
            Arc::clone(&self.clock),
            config,
        ))
    }

    /// Reports connectivity and agent counts.
    ///
    /// Never fails: an unreachable store reads as disconnected with zero
    /// counts, and a failed count reads as zero.
    pub async fn status(&self) -> HubStatus {
        if let Err(err) = self.store.ping().await {
            tracing::warn!(error = %err, "status check could not reach store");
            return HubStatus::default();
        }

        let known_agents = self.registry.members(None).await.map_or_else(
            |err| {
                tracing::warn!(error = %err, "could not count known agents");
                0
            },
            |members| members.len(),
        );
        let online_agents = self.registry.online_agents().await.map_or_else(
            |err| {
                tracing::warn!(error = %err, "could not count online agents");
                0
            },
            |agents| agents.len(),
        );
        let critical_backlog = self.messages.critical_backlog().await.map_or_else(
            |err| {
                tracing::warn!(error = %err, "could not read critical backlog");
                0
            },
            |backlog| backlog,
        );

        HubStatus {
            connected: true,
            known_agents,
            online_agents,
            critical_backlog,
        }
    }
}
