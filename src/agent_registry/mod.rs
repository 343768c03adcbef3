//! Agent registration, liveness, and discovery.
//!
//! Agents announce themselves with a type and capability list, refresh their
//! liveness through heartbeats, and are discovered by type. Records live in
//! the shared store under [`crate::store::keys`] so every process sees the
//! same registry. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]
//!
//! Persistence goes through the [`crate::store::ports::KeyValueStore`] port.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
