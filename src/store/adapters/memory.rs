//! In-memory store adapter for tests and single-process deployments.
//!
//! Key expiry is evaluated lazily against an injected [`Clock`], so tests
//! can pair this adapter with [`crate::clock::ManualClock`] and move time
//! forward instead of sleeping.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::store::ports::{KeyTtl, KeyValueStore, StoreError, StoreResult};

/// Thread-safe in-memory store with Redis-like semantics.
///
/// Clones share the same underlying keyspace.
pub struct InMemoryStore<C = DefaultClock> {
    state: Arc<RwLock<HashMap<String, Entry>>>,
    clock: Arc<C>,
}

impl<C> Clone for InMemoryStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> fmt::Debug for InMemoryStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
    Hash(HashMap<String, String>),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::List(list) => list.is_empty(),
            Self::Set(set) => set.is_empty(),
            Self::Hash(hash) => hash.is_empty(),
        }
    }
}

impl InMemoryStore<DefaultClock> {
    /// Creates an empty store driven by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryStore<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store that evaluates expiry against `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Returns `true` when `key` holds a live value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Command`] when the internal lock is poisoned.
    pub fn contains_key(&self, key: &str) -> StoreResult<bool> {
        let now = self.clock.utc();
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(key).is_some_and(|entry| is_live(entry, now)))
    }

    fn write<T>(
        &self,
        op: impl FnOnce(&mut HashMap<String, Entry>, DateTime<Utc>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let now = self.clock.utc();
        let mut state = self.state.write().map_err(poisoned)?;
        op(&mut state, now)
    }

    fn read<T>(
        &self,
        key: &str,
        op: impl FnOnce(Option<&Value>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let now = self.clock.utc();
        let state = self.state.read().map_err(poisoned)?;
        let value = state
            .get(key)
            .filter(|entry| is_live(entry, now))
            .map(|entry| &entry.value);
        op(value)
    }

    /// Mutates a collection value, creating it with `empty` when absent and
    /// dropping the key when the mutation leaves it empty.
    fn mutate_collection(
        &self,
        key: &str,
        empty: fn() -> Value,
        op: impl FnOnce(&mut Value) -> StoreResult<()>,
    ) -> StoreResult<()> {
        self.write(|state, now| {
            purge_if_expired(state, key, now);
            let entry = state.entry(key.to_owned()).or_insert_with(|| Entry {
                value: empty(),
                expires_at: None,
            });
            op(&mut entry.value)?;
            if entry.value.is_empty() {
                state.remove(key);
            }
            Ok(())
        })
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StoreError {
    StoreError::command(std::io::Error::other(err.to_string()))
}

fn is_live(entry: &Entry, now: DateTime<Utc>) -> bool {
    entry.expires_at.is_none_or(|at| at > now)
}

fn purge_if_expired(state: &mut HashMap<String, Entry>, key: &str, now: DateTime<Utc>) {
    if state.get(key).is_some_and(|entry| !is_live(entry, now)) {
        state.remove(key);
    }
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Resolves Redis-style inclusive, possibly negative, bounds to a slice range.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = isize::try_from(len).ok()?;
    let from = if start < 0 { (len + start).max(0) } else { start };
    let to = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if from > to || from >= len {
        return None;
    }
    Some((usize::try_from(from).ok()?, usize::try_from(to).ok()?))
}

#[async_trait]
impl<C> KeyValueStore for InMemoryStore<C>
where
    C: Clock + Send + Sync,
{
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.write(|state, now| {
            state.insert(
                key.to_owned(),
                Entry {
                    value: Value::Text(value.to_owned()),
                    expires_at: ttl.map(|ttl| deadline(now, ttl)),
                },
            );
            Ok(())
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.read(key, |value| match value {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(_) => Err(StoreError::wrong_type(key)),
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.write(|state, _| {
            state.remove(key);
            Ok(())
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.write(|state, now| {
            purge_if_expired(state, key, now);
            Ok(state.get_mut(key).is_some_and(|entry| {
                entry.expires_at = Some(deadline(now, ttl));
                true
            }))
        })
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let now = self.clock.utc();
        let state = self.state.read().map_err(poisoned)?;
        let ttl = match state.get(key).filter(|entry| is_live(entry, now)) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Remaining((*at - now).to_std().unwrap_or(Duration::ZERO)),
        };
        Ok(ttl)
    }

    async fn list_push(&self, key: &str, value: &str) -> StoreResult<()> {
        self.mutate_collection(
            key,
            || Value::List(VecDeque::new()),
            |stored| match stored {
                Value::List(list) => {
                    list.push_front(value.to_owned());
                    Ok(())
                }
                _ => Err(StoreError::wrong_type(key)),
            },
        )
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        self.read(key, |value| match value {
            None => Ok(Vec::new()),
            Some(Value::List(list)) => Ok(resolve_range(list.len(), start, stop)
                .map(|(from, to)| list.range(from..=to).cloned().collect())
                .unwrap_or_default()),
            Some(_) => Err(StoreError::wrong_type(key)),
        })
    }

    async fn list_remove(&self, key: &str, value: &str) -> StoreResult<()> {
        self.write(|state, now| {
            purge_if_expired(state, key, now);
            let Some(entry) = state.get_mut(key) else {
                return Ok(());
            };
            let Value::List(list) = &mut entry.value else {
                return Err(StoreError::wrong_type(key));
            };
            list.retain(|item| item != value);
            if list.is_empty() {
                state.remove(key);
            }
            Ok(())
        })
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.mutate_collection(
            key,
            || Value::Set(BTreeSet::new()),
            |stored| match stored {
                Value::Set(set) => {
                    set.insert(member.to_owned());
                    Ok(())
                }
                _ => Err(StoreError::wrong_type(key)),
            },
        )
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.write(|state, now| {
            purge_if_expired(state, key, now);
            let Some(entry) = state.get_mut(key) else {
                return Ok(());
            };
            let Value::Set(set) = &mut entry.value else {
                return Err(StoreError::wrong_type(key));
            };
            set.remove(member);
            if set.is_empty() {
                state.remove(key);
            }
            Ok(())
        })
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.read(key, |value| match value {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(_) => Err(StoreError::wrong_type(key)),
        })
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.mutate_collection(
            key,
            || Value::Hash(HashMap::new()),
            |stored| match stored {
                Value::Hash(hash) => {
                    hash.insert(field.to_owned(), value.to_owned());
                    Ok(())
                }
                _ => Err(StoreError::wrong_type(key)),
            },
        )
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        self.read(key, |value| match value {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(StoreError::wrong_type(key)),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.state.read().map(|_| ()).map_err(poisoned)
    }
}
