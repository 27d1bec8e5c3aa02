//! Read models built from published ledger events.
//!
//! Rebuildable from the journal and idempotent under at-least-once delivery.

pub mod license_catalog;

pub use license_catalog::{
    CatalogProjectionError, CreatorEarnings, LicenseCatalogProjection, LicenseSummary,
};
