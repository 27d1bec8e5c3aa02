//! Infrastructure layer: the ledger host, its journal, the event bus wiring
//! and read-side projections.

pub mod event_store;
pub mod host;
pub mod projections;
pub mod read_model;
pub mod workers;

pub use host::{HostError, LICENSE_STREAM_TYPE, LedgerHost};
