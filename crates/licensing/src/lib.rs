//! Voice licensing ledger: license registry, usage ledger and the accounting
//! engine that moves prepaid usage and funds between them.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The engine
//! is synchronous and assumes its host runs one call at a time per asset.

pub mod command;
pub mod engine;
pub mod error;
pub mod event;
pub mod funds;
pub mod gate;
pub mod license;
pub mod registry;
pub mod usage;

pub use command::{BuyUsage, InitializeVoice, LicensingCommand, UseVoice};
pub use engine::{
    AccountingEngine, LicenseState, LicenseVerification, Purchase, Transition,
};
pub use error::LicensingError;
pub use event::{LicensingEvent, UsagePurchased, VoiceInitialized, VoiceUsed};
pub use funds::{Funds, FundsError, InMemoryBalances};
pub use gate::run_gated;
pub use license::{LicenseType, RoyaltyBps, VoiceLicense, VoiceMetadata};
pub use registry::{
    EntityTable, InMemoryLicenseRegistry, InMemoryUsageLedger, LicenseRegistry, UsageLedger,
};
pub use usage::{UsageKey, UsageRecord};
