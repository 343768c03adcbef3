//! Typed, prioritised agent messages and their delivery queues.
//!
//! Messages are stored as JSON under `message:{id}` with a TTL, and their
//! ids are pushed onto the receiver's queue (plus the global critical queue
//! for critical priority). Consumers fetch, acknowledge, or let the
//! processing loop dispatch them. Delivery is at-least-once; acknowledgement
//! is idempotent so consumers can deduplicate.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::Message`], [`domain::MessageType`],
//!   [`domain::MessagePriority`] and the [`domain::MessageDraft`] builder
//! - **Services**: [`services::MessageStore`] over the
//!   [`crate::store::ports::KeyValueStore`] port
//!
//! # Example
//!
//! ```
//! use switchyard::agent_registry::domain::AgentId;
//! use switchyard::message::domain::{Message, MessagePriority, MessageType};
//! use mockable::{Clock, DefaultClock};
//! use std::time::Duration;
//!
//! let sender = AgentId::new("a1").expect("valid id");
//! let receiver = AgentId::new("a2").expect("valid id");
//! let message = Message::builder(sender, receiver, MessageType::TaskRequest)
//!     .with_priority(MessagePriority::High)
//!     .with_field("task", "x")
//!     .build(DefaultClock.utc(), Duration::from_secs(3600));
//!
//! assert!(!message.is_acknowledged());
//! assert_eq!(message.content()["task"], "x");
//! ```

pub mod domain;
pub mod error;
pub mod services;

#[cfg(test)]
mod tests;
