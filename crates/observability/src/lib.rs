//! Process-wide tracing setup shared by the ledger binaries and tests.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize tracing with the format named by `ECHOLEDGER_LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
