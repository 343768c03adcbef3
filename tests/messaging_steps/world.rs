//! Shared world state for messaging BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use switchyard::agent_registry::domain::{AgentId, AgentType};
use switchyard::clock::ManualClock;
use switchyard::message::domain::MessageId;
use switchyard::messaging::error::MessagingError;
use switchyard::messaging::hub::MessagingHub;
use switchyard::store::adapters::InMemoryStore;

/// Hub type used by the BDD world.
pub type TestHub = MessagingHub<InMemoryStore<ManualClock>, ManualClock>;

/// Scenario world for messaging behaviour tests.
pub struct MessagingWorld {
    /// Clock driving both the store and the hub.
    pub clock: ManualClock,
    /// The hub under test.
    pub hub: TestHub,
    /// Ids produced by the last broadcast.
    pub last_broadcast: Option<Vec<MessageId>>,
    /// Error returned by the last fallible step, if any.
    pub last_error: Option<MessagingError>,
}

impl MessagingWorld {
    /// Creates a world with an empty store.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::default();
        let store = Arc::new(InMemoryStore::with_clock(Arc::new(clock.clone())));
        let hub = MessagingHub::new(
            store,
            Arc::new(clock.clone()),
            Duration::from_secs(3600),
        );
        Self {
            clock,
            hub,
            last_broadcast: None,
            last_error: None,
        }
    }
}

impl Default for MessagingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MessagingWorld {
    MessagingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses an agent id from step text.
pub fn agent_id(raw: &str) -> Result<AgentId, eyre::Report> {
    AgentId::new(raw).map_err(|err| eyre::eyre!("invalid agent id '{raw}': {err}"))
}

/// Parses an agent type from step text.
pub fn agent_type(raw: &str) -> Result<AgentType, eyre::Report> {
    AgentType::new(raw).map_err(|err| eyre::eyre!("invalid agent type '{raw}': {err}"))
}
