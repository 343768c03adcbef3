//! Agent-facing messaging facade and the background processing loop.
//!
//! [`hub::MessagingHub`] wires the agent registry and message store over a
//! single injected store client and exposes the operations agents call.
//! [`processor::MessageProcessor`] drains queues in the background,
//! critical queue first, and dispatches each message to the handlers
//! registered for its type.

pub mod error;
pub mod handler;
pub mod hub;
pub mod processor;

#[cfg(test)]
mod tests;
