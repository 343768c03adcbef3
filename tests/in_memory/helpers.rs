//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use switchyard::agent_registry::domain::{AgentId, AgentType};
use switchyard::clock::ManualClock;
use switchyard::messaging::hub::MessagingHub;
use switchyard::store::adapters::InMemoryStore;

/// Default lifetime for messages and agent records in these tests.
pub const MESSAGE_TTL: Duration = Duration::from_secs(3600);

/// Hub wired to an in-memory store and a manual clock.
pub type Hub = MessagingHub<InMemoryStore<ManualClock>, ManualClock>;

/// A hub plus the clock driving it.
pub struct Fixture {
    /// Clock shared by the store and the hub.
    pub clock: ManualClock,
    /// Hub under test.
    pub hub: Hub,
}

/// Provides a fresh hub for each test.
#[fixture]
pub fn fixture() -> Fixture {
    let clock = ManualClock::default();
    let store = Arc::new(InMemoryStore::with_clock(Arc::new(clock.clone())));
    let hub = MessagingHub::new(store, Arc::new(clock.clone()), MESSAGE_TTL);
    Fixture { clock, hub }
}

/// Parses an agent id, panicking on invalid test input.
pub fn agent(raw: &str) -> AgentId {
    AgentId::new(raw).expect("valid agent id")
}

/// Parses an agent type, panicking on invalid test input.
pub fn agent_type(raw: &str) -> AgentType {
    AgentType::new(raw).expect("valid agent type")
}

/// Registers each `(id, type)` pair with no capabilities.
pub async fn register_all(hub: &Hub, agents: &[(&str, &str)]) {
    for (id, kind) in agents {
        hub.register_agent(&agent(id), &agent_type(kind), Vec::new())
            .await
            .expect("agent registers");
    }
}
