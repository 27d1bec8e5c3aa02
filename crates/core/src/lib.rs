//! `echoledger-core`: shared ids, versions and errors for the ledger crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, AssetId};
pub use version::ExpectedVersion;
