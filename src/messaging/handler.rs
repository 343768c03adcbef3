//! Per-type message handlers.
//!
//! Handlers are registered at startup and invoked by the processing loop in
//! registration order. A failing handler is logged and never stops the
//! handlers after it.

use crate::message::domain::{Message, MessageType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failure reported by a message handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("message handler failed: {reason}")]
pub struct HandlerError {
    reason: String,
}

impl HandlerError {
    /// Creates a handler error with a description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Reacts to dispatched messages of the type it was registered for.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one dispatched message.
    ///
    /// Delivery is at-least-once, so the same message may arrive more than
    /// once.
    async fn handle(&self, message: &Message) -> Result<(), HandlerError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
        (self.0)(message.clone()).await
    }
}

/// Wraps an async closure as a [`MessageHandler`].
///
/// # Examples
///
/// ```
/// use switchyard::messaging::handler::{HandlerError, handler_fn};
///
/// let handler = handler_fn(|message| async move {
///     if message.content().is_empty() {
///         return Err(HandlerError::new("empty payload"));
///     }
///     Ok(())
/// });
/// # drop(handler);
/// ```
pub fn handler_fn<F, Fut>(handler: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(handler))
}

/// Counts from dispatching one message to its handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers invoked.
    pub invoked: usize,
    /// Handlers that returned an error.
    pub failed: usize,
}

/// Shared map from message type to its ordered handlers.
///
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<MessageType, Vec<Arc<dyn MessageHandler>>>>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").finish_non_exhaustive()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for `message_type`.
    pub async fn register(&self, message_type: MessageType, handler: Arc<dyn MessageHandler>) {
        self.handlers
            .write()
            .await
            .entry(message_type)
            .or_default()
            .push(handler);
    }

    /// Returns the number of handlers registered for `message_type`.
    pub async fn count(&self, message_type: MessageType) -> usize {
        self.handlers
            .read()
            .await
            .get(&message_type)
            .map_or(0, Vec::len)
    }

    /// Invokes every handler for the message's type, in registration order.
    ///
    /// Failures are logged and counted; they never short-circuit.
    pub async fn dispatch(&self, message: &Message) -> DispatchOutcome {
        let handlers = self
            .handlers
            .read()
            .await
            .get(&message.message_type())
            .cloned()
            .unwrap_or_default();

        let mut outcome = DispatchOutcome::default();
        for handler in handlers {
            outcome.invoked += 1;
            if let Err(err) = handler.handle(message).await {
                outcome.failed += 1;
                tracing::warn!(
                    message_id = %message.id(),
                    message_type = %message.message_type(),
                    error = %err,
                    "message handler failed"
                );
            }
        }
        outcome
    }
}
