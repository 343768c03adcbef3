//! Switchyard: agent messaging and task distribution over a shared
//! key/value store.
//!
//! Independent agents register, exchange typed and prioritised messages,
//! broadcast to agent classes, acknowledge delivery, and receive
//! load-balanced task assignments. Delivery is at-least-once; consumers
//! deduplicate through idempotent acknowledgement.
//!
//! # Architecture
//!
//! Switchyard follows hexagonal architecture principles:
//!
//! - **Domain**: Validated identifiers, records, and messages
//! - **Ports**: The [`store::ports::KeyValueStore`] contract
//! - **Adapters**: Redis and in-memory store implementations
//! - **Services**: Registry, message store, facade, loop, and distributor
//!
//! # Modules
//!
//! - [`store`]: Store port, adapters, and key layout
//! - [`agent_registry`]: Agent identity, liveness, and discovery
//! - [`message`]: Message model, TTLs, and delivery queues
//! - [`messaging`]: Agent-facing facade and background processing loop
//! - [`task`]: Greedy in-memory task distribution
//! - [`config`]: Environment-driven configuration
//! - [`clock`]: Deterministic clock for tests and simulations

pub mod agent_registry;
pub mod clock;
pub mod config;
pub mod message;
pub mod messaging;
pub mod store;
pub mod task;
