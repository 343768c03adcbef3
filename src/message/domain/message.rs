//! The message aggregate and its builder.

use super::{MessageId, MessagePriority, MessageType};
use crate::agent_registry::domain::AgentId;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Arbitrary key/value payload carried by a message.
pub type MessageContent = serde_json::Map<String, Value>;

/// Retry budget recorded on new messages.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Shortest lifetime a stored message is given, even when its explicit
/// expiry is sooner.
pub const MIN_STORAGE_TTL: Duration = Duration::from_secs(60);

/// A typed, prioritised message between two agents.
///
/// # Invariants
///
/// - Every field except `delivered` and `acknowledged` is fixed at creation.
/// - `delivered` and `acknowledged` only move from `false` to `true`.
/// - `acknowledged` implies `delivered`.
/// - `expires_at` is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    sender_id: AgentId,
    receiver_id: AgentId,
    #[serde(rename = "type")]
    message_type: MessageType,
    priority: MessagePriority,
    #[serde(default)]
    content: MessageContent,
    timestamp: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    correlation_id: Option<String>,
    #[serde(default)]
    reply_to: Option<AgentId>,
    #[serde(default)]
    retry_count: u32,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default)]
    delivered: bool,
    #[serde(default)]
    acknowledged: bool,
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Message {
    /// Starts building a message from `sender_id` to `receiver_id`.
    #[must_use]
    pub fn builder(
        sender_id: AgentId,
        receiver_id: AgentId,
        message_type: MessageType,
    ) -> MessageDraft {
        MessageDraft::new(sender_id, receiver_id, message_type)
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the sending agent.
    #[must_use]
    pub const fn sender_id(&self) -> &AgentId {
        &self.sender_id
    }

    /// Returns the receiving agent.
    #[must_use]
    pub const fn receiver_id(&self) -> &AgentId {
        &self.receiver_id
    }

    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Returns the payload.
    #[must_use]
    pub const fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the expiry time.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the correlation id linking a response to its request.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns the agent responses should be addressed to, if not the sender.
    #[must_use]
    pub const fn reply_to(&self) -> Option<&AgentId> {
        self.reply_to.as_ref()
    }

    /// Returns the number of recorded retries.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns `true` once the message has been dispatched or acknowledged.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Returns `true` once the receiver has acknowledged the message.
    #[must_use]
    pub const fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Returns `true` when `expires_at` is at or before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns the agent a reply should be sent to.
    #[must_use]
    pub fn reply_target(&self) -> &AgentId {
        self.reply_to.as_ref().unwrap_or(&self.sender_id)
    }

    /// Sets the delivered flag.
    ///
    /// Returns `false` when the message was already delivered.
    pub const fn mark_delivered(&mut self) -> bool {
        let changed = !self.delivered;
        self.delivered = true;
        changed
    }

    /// Sets both the acknowledged and delivered flags.
    ///
    /// Returns `false` when the message was already acknowledged.
    pub const fn acknowledge(&mut self) -> bool {
        let changed = !self.acknowledged;
        self.acknowledged = true;
        self.delivered = true;
        changed
    }
}

/// Builder for new messages.
///
/// The id and timestamp are assigned by [`MessageDraft::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    sender_id: AgentId,
    receiver_id: AgentId,
    message_type: MessageType,
    priority: MessagePriority,
    content: MessageContent,
    correlation_id: Option<String>,
    reply_to: Option<AgentId>,
    expires_at: Option<DateTime<Utc>>,
    max_retries: u32,
}

impl MessageDraft {
    /// Creates a normal-priority draft with an empty payload.
    #[must_use]
    pub fn new(sender_id: AgentId, receiver_id: AgentId, message_type: MessageType) -> Self {
        Self {
            sender_id,
            receiver_id,
            message_type,
            priority: MessagePriority::Normal,
            content: MessageContent::new(),
            correlation_id: None,
            reply_to: None,
            expires_at: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content = content;
        self
    }

    /// Adds a single payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the agent replies should be addressed to.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: AgentId) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Sets an explicit expiry time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the sending agent.
    #[must_use]
    pub const fn sender_id(&self) -> &AgentId {
        &self.sender_id
    }

    /// Returns the receiving agent.
    #[must_use]
    pub const fn receiver_id(&self) -> &AgentId {
        &self.receiver_id
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Returns how long the stored message should live.
    ///
    /// An explicit expiry yields the time remaining until it, but never less
    /// than [`MIN_STORAGE_TTL`]; otherwise `default_ttl` applies.
    #[must_use]
    pub fn storage_ttl(&self, now: DateTime<Utc>, default_ttl: Duration) -> Duration {
        self.expires_at.map_or(default_ttl, |expires_at| {
            expires_at
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .max(MIN_STORAGE_TTL)
        })
    }

    /// Builds the message with a fresh id and `timestamp = now`.
    ///
    /// Without an explicit expiry, `expires_at` is `now + default_ttl`.
    #[must_use]
    pub fn build(self, now: DateTime<Utc>, default_ttl: Duration) -> Message {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            let ttl = TimeDelta::from_std(default_ttl).unwrap_or(TimeDelta::MAX);
            now.checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });

        Message {
            id: MessageId::new(),
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            message_type: self.message_type,
            priority: self.priority,
            content: self.content,
            timestamp: now,
            expires_at,
            correlation_id: self.correlation_id,
            reply_to: self.reply_to,
            retry_count: 0,
            max_retries: self.max_retries,
            delivered: false,
            acknowledged: false,
        }
    }
}
