//! Greedy, process-local task distribution across worker agents.
//!
//! A [`services::TaskDistributor`] maps each task's declared type to a
//! [`domain::AgentCategory`], assigns it to the least-loaded active or idle
//! worker of that category, and parks it on an overflow list when no worker
//! qualifies. Bookkeeping is in memory and owned by the distributor; it is
//! not shared across processes.
//!
//! - Domain types in [`domain`]
//! - The distributor in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
