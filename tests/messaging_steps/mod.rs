//! Step definitions for messaging BDD scenarios.

mod given;
mod then;
mod when;
pub mod world;
