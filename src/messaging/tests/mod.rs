//! Unit tests for the messaging facade and processing loop.

mod support;
