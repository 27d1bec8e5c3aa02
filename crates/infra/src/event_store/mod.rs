//! Append-only journal of ledger events, one stream per voice asset.
//!
//! The host appends every committed event here before publishing it, and
//! rebuilds engine state from it on startup.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
