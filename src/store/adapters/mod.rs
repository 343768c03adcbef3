//! Store adapter implementations.
//!
//! - [`redis`]: production adapter over a Redis connection manager
//! - [`memory`]: process-local adapter for tests and single-process use

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;
