//! Shared fixtures for messaging tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agent_registry::domain::{AgentId, AgentType};
use crate::clock::ManualClock;
use crate::message::domain::{Message, MessageId};
use crate::messaging::handler::{HandlerError, MessageHandler, handler_fn};
use crate::messaging::hub::MessagingHub;
use crate::store::adapters::InMemoryStore;
use crate::store::ports::{KeyTtl, KeyValueStore, StoreResult};
use async_trait::async_trait;
use rstest::fixture;

pub const MESSAGE_TTL: Duration = Duration::from_secs(3600);

pub type TestHub = MessagingHub<InMemoryStore<ManualClock>, ManualClock>;

pub struct Harness {
    pub clock: ManualClock,
    pub store: Arc<InMemoryStore<ManualClock>>,
    pub hub: TestHub,
}

#[fixture]
pub fn harness() -> Harness {
    let clock = ManualClock::default();
    let store = Arc::new(InMemoryStore::with_clock(Arc::new(clock.clone())));
    let hub = MessagingHub::new(Arc::clone(&store), Arc::new(clock.clone()), MESSAGE_TTL);
    Harness { clock, store, hub }
}

pub fn id(raw: &str) -> AgentId {
    AgentId::new(raw).expect("valid agent id")
}

pub fn kind(raw: &str) -> AgentType {
    AgentType::new(raw).expect("valid agent type")
}

/// Records the ids of every message it sees, optionally failing each call.
pub fn recorder(fail: bool) -> (Arc<dyn MessageHandler>, Arc<Mutex<Vec<MessageId>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler = handler_fn(move |message: Message| {
        let inner = Arc::clone(&sink);
        async move {
            inner.lock().expect("recorder lock").push(message.id());
            if fail {
                Err(HandlerError::new("boom"))
            } else {
                Ok(())
            }
        }
    });
    (handler, seen)
}

pub fn seen(log: &Mutex<Vec<MessageId>>) -> Vec<MessageId> {
    log.lock().expect("recorder lock").clone()
}

/// In-memory store that counts payload reads.
pub struct CountingStore {
    inner: InMemoryStore<ManualClock>,
    gets: AtomicUsize,
}

impl CountingStore {
    pub fn new(clock: &ManualClock) -> Self {
        Self {
            inner: InMemoryStore::with_clock(Arc::new(clock.clone())),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.gets.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.inner.expire(key, ttl).await
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        self.inner.ttl(key).await
    }

    async fn list_push(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.list_push(key, value).await
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        self.inner.list_range(key, start, stop).await
    }

    async fn list_remove(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.list_remove(key, value).await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.inner.set_remove(key, member).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.inner.hash_set(key, field, value).await
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.inner.hash_get_all(key).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}
