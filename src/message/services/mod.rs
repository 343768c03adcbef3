//! Message store service.

mod store;

pub use store::{MessageLookup, MessageStore};
