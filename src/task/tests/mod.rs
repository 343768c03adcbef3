//! Unit tests for task distribution.
