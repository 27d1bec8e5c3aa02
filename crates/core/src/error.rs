//! Errors shared by the ledger's building blocks.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures that are not licensing decisions: malformed ids, stale stream
/// versions and broken state invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Optimistic concurrency check failed on a journal stream.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored state no longer satisfies its counters' relations.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}
