//! Background message processing loop.
//!
//! Each cycle drains a bounded batch from the critical queue, then a bounded
//! batch of undelivered messages from every online agent's queue, and
//! dispatches each message to its type's handlers. A slower sweep prunes
//! expired entries from every queue.
//!
//! Errors never end the loop: a failed cycle is logged and counted, and the
//! next tick tries again. Shutdown is cooperative; a dispatch already in
//! progress finishes before the loop exits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use mockable::DefaultClock;
//! use switchyard::config::ProcessorConfig;
//! use switchyard::messaging::hub::MessagingHub;
//! use switchyard::store::adapters::InMemoryStore;
//!
//! # async fn demo() -> Result<(), switchyard::messaging::error::MessagingError> {
//! let hub = MessagingHub::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(DefaultClock),
//!     Duration::from_secs(3600),
//! );
//! let processor = hub.processor(ProcessorConfig::default());
//! processor.start().await?;
//! // ... agents exchange messages ...
//! let metrics = processor.stop().await?;
//! assert_eq!(metrics.cycle_errors, 0);
//! # Ok(())
//! # }
//! ```

use crate::agent_registry::services::AgentRegistry;
use crate::config::ProcessorConfig;
use crate::message::domain::Message;
use crate::message::error::MessageStoreError;
use crate::message::services::{MessageLookup, MessageStore};
use crate::messaging::error::{MessagingError, MessagingResult};
use crate::messaging::handler::HandlerRegistry;
use crate::store::ports::KeyValueStore;
use mockable::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

// ============================================================================
// METRICS
// ============================================================================

/// Counters for processing loop activity.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    /// Completed processing cycles.
    pub cycles: AtomicU64,
    /// Messages handed to their handlers and marked delivered.
    pub dispatched: AtomicU64,
    /// Expired messages deleted instead of dispatched.
    pub expired: AtomicU64,
    /// Handler invocations that returned an error.
    pub handler_failures: AtomicU64,
    /// Cycles or sweeps aborted by a store error.
    pub cycle_errors: AtomicU64,
    /// Queue entries removed by expiry sweeps.
    pub purged: AtomicU64,
}

impl ProcessorMetrics {
    /// Creates zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            cycle_errors: self.cycle_errors.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ProcessorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorSnapshot {
    /// Completed processing cycles.
    pub cycles: u64,
    /// Messages dispatched.
    pub dispatched: u64,
    /// Expired messages deleted.
    pub expired: u64,
    /// Failed handler invocations.
    pub handler_failures: u64,
    /// Cycles or sweeps aborted by a store error.
    pub cycle_errors: u64,
    /// Queue entries removed by sweeps.
    pub purged: u64,
}

fn bump(counter: &AtomicU64, by: usize) {
    let step = u64::try_from(by).unwrap_or(u64::MAX);
    counter.fetch_add(step, Ordering::Relaxed);
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Performs single processing cycles and sweeps.
///
/// [`run_message_processor`] drives it on a timer; tests can call
/// [`Dispatcher::run_cycle`] directly.
pub struct Dispatcher<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    registry: AgentRegistry<S, C>,
    messages: MessageStore<S, C>,
    handlers: HandlerRegistry,
    clock: Arc<C>,
    config: ProcessorConfig,
}

impl<S, C> Dispatcher<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher over shared services.
    #[must_use]
    pub const fn new(
        registry: AgentRegistry<S, C>,
        messages: MessageStore<S, C>,
        handlers: HandlerRegistry,
        clock: Arc<C>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            registry,
            messages,
            handlers,
            clock,
            config,
        }
    }

    /// Returns the loop configuration.
    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Runs one pass over the critical queue and every online agent's queue.
    ///
    /// Critical ids are removed from the critical queue whatever the handler
    /// outcome; ids already delivered by an agent pass are removed without a
    /// second dispatch. Agent queue ids stay queued until acknowledged.
    ///
    /// # Errors
    ///
    /// Returns the first store error; messages already dispatched in this
    /// pass stay dispatched.
    pub async fn run_cycle(&self, metrics: &ProcessorMetrics) -> MessagingResult<()> {
        bump(&metrics.cycles, 1);

        for message_id in self.messages.critical_ids(self.config.critical_batch).await? {
            match self.messages.lookup(message_id).await? {
                MessageLookup::Live(message) if message.is_delivered() => {
                    tracing::trace!(
                        message_id = %message_id,
                        "critical message already delivered"
                    );
                }
                MessageLookup::Live(message) => self.dispatch(message, metrics).await?,
                MessageLookup::Expired(message) => {
                    self.messages.discard(&message).await?;
                    bump(&metrics.expired, 1);
                }
                MessageLookup::Missing => {}
                MessageLookup::Corrupt(err) => {
                    tracing::warn!(
                        message_id = %message_id,
                        error = %err,
                        "skipping unreadable critical message"
                    );
                }
            }
            self.messages.remove_from_critical(message_id).await?;
        }

        for agent_id in self.registry.online_agents().await? {
            for message in self
                .messages
                .undelivered(&agent_id, self.config.agent_batch)
                .await?
            {
                self.dispatch(message, metrics).await?;
            }
        }
        Ok(())
    }

    /// Prunes expired entries from every online agent's queue and the
    /// critical queue, returning the number removed.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn sweep(&self, metrics: &ProcessorMetrics) -> MessagingResult<usize> {
        let agents = self.registry.members(None).await?;
        let purged = self.messages.purge_expired(&agents).await?;
        bump(&metrics.purged, purged);
        Ok(purged)
    }

    async fn dispatch(&self, message: Message, metrics: &ProcessorMetrics) -> MessagingResult<()> {
        if message.is_expired(self.clock.utc()) {
            self.messages.discard(&message).await?;
            bump(&metrics.expired, 1);
            return Ok(());
        }

        let outcome = self.handlers.dispatch(&message).await;
        bump(&metrics.handler_failures, outcome.failed);

        match self.messages.mark_delivered(message.id()).await {
            Ok(()) => {
                bump(&metrics.dispatched, 1);
                tracing::trace!(
                    message_id = %message.id(),
                    handlers = outcome.invoked,
                    "message dispatched"
                );
                Ok(())
            }
            Err(MessageStoreError::NotFound(message_id)) => {
                tracing::debug!(message_id = %message_id, "message consumed during dispatch");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Runs the processing loop until `shutdown` turns `true` or its sender is
/// dropped.
///
/// Returns the metrics collected over the loop's lifetime.
pub async fn run_message_processor<S, C>(
    dispatcher: Arc<Dispatcher<S, C>>,
    mut shutdown: watch::Receiver<bool>,
) -> Arc<ProcessorMetrics>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    let metrics = Arc::new(ProcessorMetrics::new());
    let config = dispatcher.config().clone();

    let mut poll = interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sweep = interval(config.sweep_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let poll_interval_ms = u64::try_from(config.poll_interval.as_millis())
        .unwrap_or(u64::MAX);
    tracing::info!(
        poll_interval_ms,
        critical_batch = config.critical_batch,
        agent_batch = config.agent_batch,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "message processor started"
    );

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            _ = poll.tick() => {
                if let Err(err) = dispatcher.run_cycle(&metrics).await {
                    bump(&metrics.cycle_errors, 1);
                    tracing::warn!(
                        error = %err,
                        unavailable = err.is_unavailable(),
                        "processing cycle failed"
                    );
                }
            }

            _ = sweep.tick() => {
                if let Err(err) = dispatcher.sweep(&metrics).await {
                    bump(&metrics.cycle_errors, 1);
                    tracing::warn!(error = %err, "expiry sweep failed");
                }
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        cycles = snapshot.cycles,
        dispatched = snapshot.dispatched,
        expired = snapshot.expired,
        handler_failures = snapshot.handler_failures,
        cycle_errors = snapshot.cycle_errors,
        purged = snapshot.purged,
        "message processor stopped"
    );
    metrics
}

// ============================================================================
// LIFECYCLE HANDLE
// ============================================================================

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Arc<ProcessorMetrics>>,
}

/// Start/stop handle for one processing loop per process.
///
/// Start and stop are serialised by an internal mutex.
pub struct MessageProcessor<S, C>
where
    S: KeyValueStore,
    C: Clock + Send + Sync,
{
    dispatcher: Arc<Dispatcher<S, C>>,
    running: Mutex<Option<RunningLoop>>,
}

impl<S, C> MessageProcessor<S, C>
where
    S: KeyValueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Wraps a dispatcher in a stopped processor.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<S, C>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            running: Mutex::new(None),
        }
    }

    /// Returns the dispatcher driven by this processor.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher<S, C>> {
        &self.dispatcher
    }

    /// Spawns the loop on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::ProcessorAlreadyRunning`] when the loop is
    /// active.
    pub async fn start(&self) -> MessagingResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(MessagingError::ProcessorAlreadyRunning);
        }
        let (shutdown, receiver) = watch::channel(false);
        let handle = tokio::spawn(run_message_processor(
            Arc::clone(&self.dispatcher),
            receiver,
        ));
        *running = Some(RunningLoop { shutdown, handle });
        Ok(())
    }

    /// Signals the loop to stop, waits for the in-flight cycle to finish,
    /// and returns the final metrics.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::ProcessorNotRunning`] when the loop is not
    /// active.
    pub async fn stop(&self) -> MessagingResult<ProcessorSnapshot> {
        let mut running = self.running.lock().await;
        let Some(RunningLoop { shutdown, handle }) = running.take() else {
            return Err(MessagingError::ProcessorNotRunning);
        };
        if shutdown.send(true).is_err() {
            tracing::debug!("message processor exited before shutdown signal");
        }
        // Held until the loop has exited.
        let snapshot = match handle.await {
            Ok(metrics) => metrics.snapshot(),
            Err(err) => {
                tracing::error!(error = %err, "message processor task failed");
                ProcessorSnapshot::default()
            }
        };
        drop(running);
        Ok(snapshot)
    }

    /// Returns `true` while the loop is active.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}
