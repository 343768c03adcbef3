//! Unit tests for the message context.
