//! Redis store adapter.
//!
//! Commands go through a multiplexed [`ConnectionManager`], which reconnects
//! transparently after a dropped connection. Every round trip is bounded by
//! the configured store timeout so an unreachable server surfaces as
//! [`StoreError::Timeout`] instead of hanging the caller.

use ::redis::aio::ConnectionManager;
use ::redis::{Cmd, FromRedisValue, RedisError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::MessagingConfig;
use crate::store::ports::{KeyTtl, KeyValueStore, StoreError, StoreResult};

/// Store adapter backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    timeout: Duration,
}

impl RedisStore {
    /// Connects to the server described by `config` and verifies it with
    /// `PING`.
    ///
    /// There is no degraded mode: callers must treat a failure here as fatal
    /// for the messaging subsystem.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the URL is rejected or the
    /// connection fails, and [`StoreError::Timeout`] when connecting or the
    /// initial ping exceeds `config.store_timeout`.
    pub async fn connect(config: &MessagingConfig) -> StoreResult<Self> {
        let client = ::redis::Client::open(config.connection_url())
            .map_err(StoreError::unavailable)?;
        let connection = tokio::time::timeout(config.store_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout {
                operation: "CONNECT",
                timeout: config.store_timeout,
            })?
            .map_err(StoreError::unavailable)?;

        let store = Self {
            connection,
            timeout: config.store_timeout,
        };
        store.ping().await?;
        tracing::info!(endpoint = %config.endpoint(), "connected to store");
        Ok(store)
    }

    async fn run<T>(&self, operation: &'static str, cmd: Cmd) -> StoreResult<T>
    where
        T: FromRedisValue + Send,
    {
        let mut connection = self.connection.clone();
        let query = cmd.query_async(&mut connection);
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }
}

fn classify(err: RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::unavailable(err)
    } else {
        StoreError::command(err)
    }
}

/// Millisecond TTL suitable for `PX`/`PEXPIRE`; Redis rejects zero.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        self.run("SET", cmd).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut cmd = ::redis::cmd("GET");
        cmd.arg(key);
        self.run("GET", cmd).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("DEL");
        cmd.arg(key);
        self.run("DEL", cmd).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut cmd = ::redis::cmd("PEXPIRE");
        cmd.arg(key).arg(ttl_millis(ttl));
        self.run("PEXPIRE", cmd).await
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let mut cmd = ::redis::cmd("PTTL");
        cmd.arg(key);
        let millis: i64 = self.run("PTTL", cmd).await?;
        Ok(match millis {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            ms => KeyTtl::Remaining(Duration::from_millis(u64::try_from(ms).unwrap_or(0))),
        })
    }

    async fn list_push(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("LPUSH");
        cmd.arg(key).arg(value);
        self.run("LPUSH", cmd).await
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        let mut cmd = ::redis::cmd("LRANGE");
        cmd.arg(key).arg(start).arg(stop);
        self.run("LRANGE", cmd).await
    }

    async fn list_remove(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("LREM");
        cmd.arg(key).arg(0).arg(value);
        self.run("LREM", cmd).await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("SADD");
        cmd.arg(key).arg(member);
        self.run("SADD", cmd).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("SREM");
        cmd.arg(key).arg(member);
        self.run("SREM", cmd).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut cmd = ::redis::cmd("SMEMBERS");
        cmd.arg(key);
        self.run("SMEMBERS", cmd).await
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut cmd = ::redis::cmd("HSET");
        cmd.arg(key).arg(field).arg(value);
        self.run("HSET", cmd).await
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<HashMap<String, String>> {
        let mut cmd = ::redis::cmd("HGETALL");
        cmd.arg(key);
        self.run("HGETALL", cmd).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.run("PING", ::redis::cmd("PING")).await
    }
}
