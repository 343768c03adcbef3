//! Unit tests for the store adapters.

mod memory_tests;
