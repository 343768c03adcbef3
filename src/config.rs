//! Runtime configuration for the messaging core.
//!
//! [`MessagingConfig`] carries store connection parameters and message
//! lifetime policy; [`ProcessorConfig`] carries the processing loop cadence.
//! Both load from `SWITCHYARD_*` environment variables, falling back to
//! defaults for anything unset or unparsable.

use std::fmt;
use std::time::Duration;

const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_MESSAGE_TTL_SECS: u64 = 3600;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_CRITICAL_BATCH: usize = 10;
const DEFAULT_AGENT_BATCH: usize = 5;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Store connection and message lifetime settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MessagingConfig {
    /// Store host name.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// Optional ACL user name.
    pub username: Option<String>,
    /// Optional password; never printed by `Debug`.
    pub password: Option<String>,
    /// Connect over TLS (`rediss://`).
    pub tls: bool,
    /// Logical database index.
    pub database: i64,
    /// Default lifetime of messages, queues, and agent records.
    pub message_ttl: Duration,
    /// Upper bound for a single store round trip.
    pub store_timeout: Duration,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_REDIS_HOST.to_owned(),
            port: DEFAULT_REDIS_PORT,
            username: None,
            password: None,
            tls: false,
            database: 0,
            message_ttl: Duration::from_secs(DEFAULT_MESSAGE_TTL_SECS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tls", &self.tls)
            .field("database", &self.database)
            .field("message_ttl", &self.message_ttl)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl MessagingConfig {
    /// Loads settings from the process environment.
    ///
    /// # Environment Variables
    /// - `SWITCHYARD_REDIS_HOST` (default `127.0.0.1`)
    /// - `SWITCHYARD_REDIS_PORT` (default 6379)
    /// - `SWITCHYARD_REDIS_USERNAME`, `SWITCHYARD_REDIS_PASSWORD`
    /// - `SWITCHYARD_REDIS_TLS` (`true`/`1` enables TLS)
    /// - `SWITCHYARD_REDIS_DB` (default 0)
    /// - `SWITCHYARD_MESSAGE_TTL_SECS` (default 3600)
    /// - `SWITCHYARD_STORE_TIMEOUT_MS` (default 5000)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("SWITCHYARD_REDIS_HOST")
                .map(|host| host.trim().to_owned())
                .filter(|host| !host.is_empty())
                .unwrap_or(defaults.host),
            port: parsed(&lookup, "SWITCHYARD_REDIS_PORT").unwrap_or(defaults.port),
            username: non_empty(lookup("SWITCHYARD_REDIS_USERNAME")),
            password: non_empty(lookup("SWITCHYARD_REDIS_PASSWORD")),
            tls: lookup("SWITCHYARD_REDIS_TLS").is_some_and(|value| is_truthy(&value)),
            database: parsed(&lookup, "SWITCHYARD_REDIS_DB").unwrap_or(defaults.database),
            message_ttl: parsed(&lookup, "SWITCHYARD_MESSAGE_TTL_SECS")
                .map_or(defaults.message_ttl, Duration::from_secs),
            store_timeout: parsed(&lookup, "SWITCHYARD_STORE_TIMEOUT_MS")
                .map_or(defaults.store_timeout, Duration::from_millis),
        }
    }

    /// Sets the store endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Sets the store credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: Option<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username;
        self.password = Some(password.into());
        self
    }

    /// Enables or disables TLS.
    #[must_use]
    pub const fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the default message lifetime.
    #[must_use]
    pub const fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl = ttl;
        self
    }

    /// Sets the per-call store timeout.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Builds the connection URL understood by the `redis` client.
    ///
    /// Credentials are percent-encoded but otherwise embedded as given;
    /// callers must not log the result.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let auth = match (
            self.username.as_deref().map(urlencoding::encode),
            self.password.as_deref().map(urlencoding::encode),
        ) {
            (Some(user), Some(password)) => format!("{user}:{password}@"),
            (None, Some(password)) => format!(":{password}@"),
            (Some(user), None) => format!("{user}@"),
            (None, None) => String::new(),
        };
        format!(
            "{scheme}://{auth}{host}:{port}/{db}",
            host = self.host,
            port = self.port,
            db = self.database
        )
    }

    /// Describes the endpoint without credentials, for logs.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Cadence and batch sizes for the message processing loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Sleep between processing cycles.
    pub poll_interval: Duration,
    /// Maximum ids taken from the critical queue per cycle.
    pub critical_batch: usize,
    /// Maximum undelivered messages dispatched per agent per cycle.
    pub agent_batch: usize,
    /// How often the loop sweeps every queue for expired messages.
    pub sweep_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            critical_batch: DEFAULT_CRITICAL_BATCH,
            agent_batch: DEFAULT_AGENT_BATCH,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl ProcessorConfig {
    /// Loads settings from the process environment.
    ///
    /// # Environment Variables
    /// - `SWITCHYARD_POLL_INTERVAL_MS` (default 100)
    /// - `SWITCHYARD_CRITICAL_BATCH` (default 10)
    /// - `SWITCHYARD_AGENT_BATCH` (default 5)
    /// - `SWITCHYARD_SWEEP_INTERVAL_SECS` (default 60)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// Zero values are rejected in favour of the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: parsed(&lookup, "SWITCHYARD_POLL_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map_or(defaults.poll_interval, Duration::from_millis),
            critical_batch: parsed(&lookup, "SWITCHYARD_CRITICAL_BATCH")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.critical_batch),
            agent_batch: parsed(&lookup, "SWITCHYARD_AGENT_BATCH")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.agent_batch),
            sweep_interval: parsed(&lookup, "SWITCHYARD_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map_or(defaults.sweep_interval, Duration::from_secs),
        }
    }

    /// Sets the sleep between cycles.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the expiry sweep interval.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
