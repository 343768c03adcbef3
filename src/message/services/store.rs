//! Store-backed message persistence and per-agent delivery queues.
//!
//! Message payloads live under `message:{id}`; queues hold ids only and are
//! pushed at the head, so the oldest id sits at the tail. Each agent has a
//! delivery queue, read by consumers until acknowledgement, and a pending
//! list, drained by the processing loop as messages are delivered. Expired
//! or missing entries are pruned lazily whenever a queue is read.

use crate::agent_registry::domain::{AgentId, AgentType};
use crate::message::domain::{
    Message, MessageContent, MessageDraft, MessageId, MessagePriority, MessageType,
};
use crate::message::error::{MessageStoreError, MessageStoreResult};
use crate::store::keys;
use crate::store::ports::{KeyTtl, KeyValueStore};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of reading a single message by id.
#[derive(Debug, Clone)]
pub enum MessageLookup {
    /// The message exists and has not expired.
    Live(Message),
    /// The payload is still stored but `expires_at` has passed.
    Expired(Message),
    /// No payload is stored under the id.
    Missing,
    /// The payload could not be decoded.
    Corrupt(Arc<serde_json::Error>),
}

enum QueueEntry {
    Live(Message),
    Pruned,
    Skipped,
}

/// Message persistence over a [`KeyValueStore`].
pub struct MessageStore<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    message_ttl: Duration,
}

impl<S, C> Clone for MessageStore<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            message_ttl: self.message_ttl,
        }
    }
}

impl<S, C> MessageStore<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Creates a message store whose messages default to `message_ttl`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, message_ttl: Duration) -> Self {
        Self {
            store,
            clock,
            message_ttl,
        }
    }

    /// Returns the default message lifetime.
    #[must_use]
    pub const fn message_ttl(&self) -> Duration {
        self.message_ttl
    }

    /// Persists a new message and queues it for its receiver.
    ///
    /// Critical messages are also pushed onto the global critical queue.
    /// Returns as soon as the message is stored; delivery is not awaited.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Serialization`] when the payload cannot
    /// be encoded and [`MessageStoreError::Store`] when a write fails.
    pub async fn send(&self, draft: MessageDraft) -> MessageStoreResult<MessageId> {
        let now = self.clock.utc();
        let ttl = draft.storage_ttl(now, self.message_ttl);
        let message = draft.build(now, self.message_ttl);
        self.persist_new(&message, ttl).await?;
        tracing::debug!(
            message_id = %message.id(),
            sender_id = %message.sender_id(),
            receiver_id = %message.receiver_id(),
            message_type = %message.message_type(),
            priority = %message.priority(),
            "message sent"
        );
        Ok(message.id())
    }

    /// Sends one copy of a message to every member of `agent_type`,
    /// excluding `sender`.
    ///
    /// The `all` pseudo-type addresses every agent in `agents:online`. A
    /// failed send is logged and does not stop the remaining sends; its id
    /// is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when the membership set cannot
    /// be read.
    pub async fn broadcast(
        &self,
        sender: &AgentId,
        agent_type: &AgentType,
        message_type: MessageType,
        priority: MessagePriority,
        content: MessageContent,
    ) -> MessageStoreResult<Vec<MessageId>> {
        let set_key = if agent_type.is_all() {
            keys::ONLINE_AGENTS.to_owned()
        } else {
            keys::agents_of_type(agent_type)
        };
        let recipients = self
            .store
            .set_members(&set_key)
            .await?
            .into_iter()
            .filter_map(|member| AgentId::new(member).ok())
            .filter(|recipient| recipient != sender);

        let now = self.clock.utc();
        let mut ids = Vec::new();
        for recipient in recipients {
            let message = Message::builder(sender.clone(), recipient, message_type)
                .with_priority(priority)
                .with_content(content.clone())
                .build(now, self.message_ttl);
            if let Err(err) = self.persist_new(&message, self.message_ttl).await {
                tracing::warn!(
                    message_id = %message.id(),
                    receiver_id = %message.receiver_id(),
                    error = %err,
                    "broadcast send failed"
                );
            }
            ids.push(message.id());
        }

        tracing::debug!(
            sender_id = %sender,
            agent_type = %agent_type,
            message_type = %message_type,
            recipients = ids.len(),
            "message broadcast"
        );
        Ok(ids)
    }

    /// Sends a `task_response` answering `original`.
    ///
    /// The reply goes to `original.reply_to` when set and to the original
    /// sender otherwise, carries the original priority, and is correlated
    /// with the original id.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::send`].
    pub async fn reply(
        &self,
        original: &Message,
        sender: &AgentId,
        content: MessageContent,
    ) -> MessageStoreResult<MessageId> {
        let draft = Message::builder(
            sender.clone(),
            original.reply_target().clone(),
            MessageType::TaskResponse,
        )
        .with_priority(original.priority())
        .with_content(content)
        .with_correlation_id(original.id().to_string());
        self.send(draft).await
    }

    /// Returns the live messages queued for `agent_id`.
    ///
    /// Expired or vanished entries are deleted and removed from the queue
    /// as they are found. Results are filtered by `type_filter` and ordered
    /// by priority, then timestamp, both descending.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when a store call fails.
    pub async fn fetch(
        &self,
        agent_id: &AgentId,
        type_filter: Option<MessageType>,
    ) -> MessageStoreResult<Vec<Message>> {
        let queue_key = keys::agent_queue(agent_id);
        let raw_ids = self.store.list_range(&queue_key, 0, -1).await?;

        let mut seen = HashSet::with_capacity(raw_ids.len());
        let mut messages = Vec::with_capacity(raw_ids.len());
        for raw_id in raw_ids {
            if !seen.insert(raw_id.clone()) {
                continue;
            }
            if let QueueEntry::Live(message) = self.resolve_entry(&queue_key, &raw_id).await? {
                messages.push(message);
            }
        }

        if let Some(message_type) = type_filter {
            messages.retain(|entry| entry.message_type() == message_type);
        }
        messages.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| b.timestamp().cmp(&a.timestamp()))
        });
        Ok(messages)
    }

    /// Marks a message acknowledged and removes it from the agent's queue
    /// and the critical queue.
    ///
    /// The remaining TTL is preserved. Acknowledging a message that no
    /// longer exists succeeds, since it has already been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Serialization`] when the stored payload
    /// is unreadable and [`MessageStoreError::Store`] on store failure.
    pub async fn acknowledge(
        &self,
        message_id: MessageId,
        agent_id: &AgentId,
    ) -> MessageStoreResult<()> {
        match self.lookup(message_id).await? {
            MessageLookup::Live(mut message) => {
                if message.acknowledge() {
                    match self.rewrite(&message).await {
                        Ok(()) | Err(MessageStoreError::NotFound(_)) => {}
                        Err(err) => return Err(err),
                    }
                }
            }
            MessageLookup::Expired(_) => {
                self.store.delete(&keys::message(message_id)).await?;
            }
            MessageLookup::Missing => {
                tracing::debug!(message_id = %message_id, "acknowledged message already consumed");
            }
            MessageLookup::Corrupt(err) => return Err(MessageStoreError::Serialization(err)),
        }

        let raw_id = message_id.to_string();
        self.store
            .list_remove(&keys::agent_queue(agent_id), &raw_id)
            .await?;
        self.store
            .list_remove(&keys::pending_queue(agent_id), &raw_id)
            .await?;
        self.store.list_remove(keys::CRITICAL_QUEUE, &raw_id).await?;
        Ok(())
    }

    /// Returns a single message by id.
    ///
    /// Expired messages read as `None` and are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Serialization`] when the stored payload
    /// is unreadable and [`MessageStoreError::Store`] on store failure.
    pub async fn get(&self, message_id: MessageId) -> MessageStoreResult<Option<Message>> {
        match self.lookup(message_id).await? {
            MessageLookup::Live(message) => Ok(Some(message)),
            MessageLookup::Expired(_) => {
                self.store.delete(&keys::message(message_id)).await?;
                Ok(None)
            }
            MessageLookup::Missing => Ok(None),
            MessageLookup::Corrupt(err) => Err(MessageStoreError::Serialization(err)),
        }
    }

    /// Reads and classifies the payload stored for `message_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when the read fails.
    pub async fn lookup(&self, message_id: MessageId) -> MessageStoreResult<MessageLookup> {
        let Some(payload) = self.store.get(&keys::message(message_id)).await? else {
            return Ok(MessageLookup::Missing);
        };
        Ok(match serde_json::from_str::<Message>(&payload) {
            Ok(message) if message.is_expired(self.clock.utc()) => {
                MessageLookup::Expired(message)
            }
            Ok(message) => MessageLookup::Live(message),
            Err(err) => MessageLookup::Corrupt(Arc::new(err)),
        })
    }

    /// Sets the delivered flag on the stored copy of a message, leaving
    /// `acknowledged` and the remaining TTL untouched, and drops the id from
    /// the receiver's pending list.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::NotFound`] when the message is gone or
    /// expired, [`MessageStoreError::Serialization`] when it is unreadable,
    /// and [`MessageStoreError::Store`] on store failure.
    pub async fn mark_delivered(&self, message_id: MessageId) -> MessageStoreResult<()> {
        match self.lookup(message_id).await? {
            MessageLookup::Live(mut message) => {
                if message.mark_delivered() {
                    self.rewrite(&message).await?;
                }
                self.store
                    .list_remove(
                        &keys::pending_queue(message.receiver_id()),
                        &message_id.to_string(),
                    )
                    .await?;
                Ok(())
            }
            MessageLookup::Expired(_) | MessageLookup::Missing => {
                Err(MessageStoreError::NotFound(message_id))
            }
            MessageLookup::Corrupt(err) => Err(MessageStoreError::Serialization(err)),
        }
    }

    /// Deletes a message and removes its id from the receiver's queues and
    /// the critical queue.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when a store call fails.
    pub async fn discard(&self, message: &Message) -> MessageStoreResult<()> {
        let raw_id = message.id().to_string();
        self.store.delete(&keys::message(message.id())).await?;
        self.store
            .list_remove(&keys::agent_queue(message.receiver_id()), &raw_id)
            .await?;
        self.store
            .list_remove(&keys::pending_queue(message.receiver_id()), &raw_id)
            .await?;
        self.store.list_remove(keys::CRITICAL_QUEUE, &raw_id).await?;
        Ok(())
    }

    /// Returns up to `limit` live, undelivered messages for `agent_id`,
    /// oldest first.
    ///
    /// Only the oldest `limit` entries of the agent's pending list are read.
    /// Entries that turn out to be delivered, expired, vanished, or
    /// unreadable are dropped from the pending list, so a later call moves on
    /// to newer ids. The delivery queue itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when a store call fails.
    pub async fn undelivered(
        &self,
        agent_id: &AgentId,
        limit: usize,
    ) -> MessageStoreResult<Vec<Message>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let pending_key = keys::pending_queue(agent_id);
        let start = -isize::try_from(limit).unwrap_or(isize::MAX);
        let raw_ids = self.store.list_range(&pending_key, start, -1).await?;

        let mut seen = HashSet::with_capacity(raw_ids.len());
        let mut pending = Vec::with_capacity(raw_ids.len());
        for raw_id in raw_ids.into_iter().rev() {
            if !seen.insert(raw_id.clone()) {
                continue;
            }
            match self.resolve_entry(&pending_key, &raw_id).await? {
                QueueEntry::Live(message) if !message.is_delivered() => pending.push(message),
                QueueEntry::Live(_) | QueueEntry::Skipped => {
                    self.store.list_remove(&pending_key, &raw_id).await?;
                }
                QueueEntry::Pruned => {}
            }
        }
        Ok(pending)
    }

    /// Returns up to `limit` ids from the critical queue, oldest first.
    ///
    /// Entries that are not valid message ids are dropped from the queue.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when a store call fails.
    pub async fn critical_ids(&self, limit: usize) -> MessageStoreResult<Vec<MessageId>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let start = -isize::try_from(limit).unwrap_or(isize::MAX);
        let raw_ids = self
            .store
            .list_range(keys::CRITICAL_QUEUE, start, -1)
            .await?;

        let mut ids = Vec::with_capacity(raw_ids.len());
        for raw_id in raw_ids.into_iter().rev() {
            match raw_id.parse::<MessageId>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => {
                    tracing::warn!(
                        queue = keys::CRITICAL_QUEUE,
                        entry = %raw_id,
                        "dropping malformed queue entry"
                    );
                    self.store.list_remove(keys::CRITICAL_QUEUE, &raw_id).await?;
                }
            }
        }
        Ok(ids)
    }

    /// Removes an id from the critical queue.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when the store call fails.
    pub async fn remove_from_critical(&self, message_id: MessageId) -> MessageStoreResult<()> {
        self.store
            .list_remove(keys::CRITICAL_QUEUE, &message_id.to_string())
            .await?;
        Ok(())
    }

    /// Returns the number of ids waiting in the critical queue.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when the store call fails.
    pub async fn critical_backlog(&self) -> MessageStoreResult<usize> {
        Ok(self
            .store
            .list_range(keys::CRITICAL_QUEUE, 0, -1)
            .await?
            .len())
    }

    /// Prunes expired and vanished entries from the queues of `agents` and
    /// from the critical queue.
    ///
    /// Returns the number of queue entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Store`] when a store call fails.
    pub async fn purge_expired(&self, agents: &[AgentId]) -> MessageStoreResult<usize> {
        let mut purged = 0;
        for agent_id in agents {
            purged += self.purge_queue(&keys::agent_queue(agent_id)).await?;
        }
        purged += self.purge_queue(keys::CRITICAL_QUEUE).await?;
        if purged > 0 {
            tracing::debug!(purged, "purged expired queue entries");
        }
        Ok(purged)
    }

    async fn purge_queue(&self, queue_key: &str) -> MessageStoreResult<usize> {
        let raw_ids = self.store.list_range(queue_key, 0, -1).await?;
        let mut seen = HashSet::with_capacity(raw_ids.len());
        let mut purged = 0;
        for raw_id in raw_ids {
            if !seen.insert(raw_id.clone()) {
                continue;
            }
            if matches!(
                self.resolve_entry(queue_key, &raw_id).await?,
                QueueEntry::Pruned
            ) {
                purged += 1;
            }
        }
        Ok(purged)
    }

    async fn persist_new(&self, message: &Message, ttl: Duration) -> MessageStoreResult<()> {
        let payload = serde_json::to_string(message)?;
        let raw_id = message.id().to_string();
        self.store
            .set(&keys::message(message.id()), &payload, Some(ttl))
            .await?;

        for queue_key in [
            keys::agent_queue(message.receiver_id()),
            keys::pending_queue(message.receiver_id()),
        ] {
            self.store.list_push(&queue_key, &raw_id).await?;
            self.store.expire(&queue_key, self.message_ttl).await?;
        }

        if message.priority() == MessagePriority::Critical {
            self.store.list_push(keys::CRITICAL_QUEUE, &raw_id).await?;
        }
        Ok(())
    }

    /// Overwrites a stored message, keeping the key's remaining lifetime.
    async fn rewrite(&self, message: &Message) -> MessageStoreResult<()> {
        let key = keys::message(message.id());
        let ttl = match self.store.ttl(&key).await? {
            KeyTtl::Missing => return Err(MessageStoreError::NotFound(message.id())),
            KeyTtl::Persistent => None,
            KeyTtl::Remaining(remaining) => Some(remaining),
        };
        let payload = serde_json::to_string(message)?;
        self.store.set(&key, &payload, ttl).await?;
        Ok(())
    }

    async fn resolve_entry(&self, queue_key: &str, raw_id: &str) -> MessageStoreResult<QueueEntry> {
        let Ok(message_id) = raw_id.parse::<MessageId>() else {
            tracing::warn!(queue = %queue_key, entry = %raw_id, "dropping malformed queue entry");
            self.store.list_remove(queue_key, raw_id).await?;
            return Ok(QueueEntry::Pruned);
        };

        match self.lookup(message_id).await? {
            MessageLookup::Live(message) => Ok(QueueEntry::Live(message)),
            MessageLookup::Expired(_) => {
                self.store.delete(&keys::message(message_id)).await?;
                self.store.list_remove(queue_key, raw_id).await?;
                tracing::debug!(
                    message_id = %message_id,
                    queue = %queue_key,
                    "removed expired message"
                );
                Ok(QueueEntry::Pruned)
            }
            MessageLookup::Missing => {
                self.store.list_remove(queue_key, raw_id).await?;
                Ok(QueueEntry::Pruned)
            }
            MessageLookup::Corrupt(err) => {
                tracing::warn!(
                    message_id = %message_id,
                    error = %err,
                    "skipping unreadable message"
                );
                Ok(QueueEntry::Skipped)
            }
        }
    }
}
