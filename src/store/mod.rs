//! Key/value store boundary for the messaging core.
//!
//! Every piece of shared state (messages, delivery queues, agent records and
//! membership sets) lives behind the [`ports::KeyValueStore`] contract, which
//! mirrors the Redis primitives the protocol is defined on. The module
//! follows hexagonal architecture:
//!
//! - Port contract and error taxonomy in [`ports`]
//! - Redis and in-memory implementations in [`adapters`]
//! - The shared key layout in [`keys`]

pub mod adapters;
pub mod keys;
pub mod ports;

#[cfg(test)]
mod tests;
