//! Domain model for agent messages.
//!
//! A message is immutable after creation apart from its `delivered` and
//! `acknowledged` flags, which only ever move from `false` to `true`.

mod error;
mod ids;
mod kind;
mod message;
mod priority;

pub use error::{ParseMessagePriorityError, ParseMessageTypeError};
pub use ids::MessageId;
pub use kind::MessageType;
pub use message::{DEFAULT_MAX_RETRIES, MIN_STORAGE_TTL, Message, MessageContent, MessageDraft};
pub use priority::MessagePriority;
