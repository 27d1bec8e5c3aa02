use serde::{Deserialize, Serialize};

use echoledger_core::{ActorId, AssetId, DomainError, DomainResult, Entity};

use crate::error::LicensingError;
use crate::event::VoiceInitialized;

/// Downstream permission class of a license.
///
/// Recorded by the ledger, enforced by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    Personal,
    Commercial,
}

impl LicenseType {
    /// Parse the compact wire code (0 = personal, 1 = commercial).
    pub fn from_code(code: u8) -> Result<Self, LicensingError> {
        match code {
            0 => Ok(Self::Personal),
            1 => Ok(Self::Commercial),
            other => Err(LicensingError::invalid(format!(
                "license type must be 0 (personal) or 1 (commercial), got {other}"
            ))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Personal => 0,
            Self::Commercial => 1,
        }
    }

    pub fn allows_ai_training(self) -> bool {
        matches!(self, Self::Commercial)
    }

    pub fn requires_attribution(self) -> bool {
        matches!(self, Self::Personal)
    }
}

/// Royalty rate in basis points (1/100 of a percent), at most 10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct RoyaltyBps(u16);

impl RoyaltyBps {
    pub const MAX: u16 = 10_000;

    pub fn new(bps: u16) -> Result<Self, LicensingError> {
        if bps > Self::MAX {
            return Err(LicensingError::invalid(format!(
                "royalty basis points must be <= {}, got {bps}",
                Self::MAX
            )));
        }
        Ok(Self(bps))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for RoyaltyBps {
    type Error = LicensingError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoyaltyBps> for u16 {
    fn from(value: RoyaltyBps) -> Self {
        value.0
    }
}

/// Descriptive metadata supplied when a voice is registered.
///
/// Carried on the `VoiceInitialized` event for catalogs; the license record
/// itself does not store it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// Authoritative license for one voice asset.
///
/// Configuration fields are immutable after creation. Counters change only
/// through the accounting engine:
/// - `remaining_uses` only decreases, by the amount sold
/// - `total_earnings` and `total_uses` only increase
/// - `total_uses <= max_uses - remaining_uses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceLicense {
    asset_id: AssetId,
    creator: ActorId,
    price_per_use: u64,
    max_uses: u32,
    remaining_uses: u32,
    license_type: LicenseType,
    resale_allowed: bool,
    royalty_bps: RoyaltyBps,
    consent_confirmed: bool,
    total_earnings: u64,
    total_uses: u32,
}

impl VoiceLicense {
    pub(crate) fn from_initialized(e: &VoiceInitialized) -> Self {
        Self {
            asset_id: e.asset_id,
            creator: e.creator,
            price_per_use: e.price_per_use,
            max_uses: e.max_uses,
            remaining_uses: e.max_uses,
            license_type: e.license_type,
            resale_allowed: e.resale_allowed,
            royalty_bps: e.royalty_bps,
            consent_confirmed: true,
            total_earnings: 0,
            total_uses: 0,
        }
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn creator(&self) -> ActorId {
        self.creator
    }

    pub fn price_per_use(&self) -> u64 {
        self.price_per_use
    }

    pub fn max_uses(&self) -> u32 {
        self.max_uses
    }

    pub fn remaining_uses(&self) -> u32 {
        self.remaining_uses
    }

    pub fn license_type(&self) -> LicenseType {
        self.license_type
    }

    pub fn resale_allowed(&self) -> bool {
        self.resale_allowed
    }

    pub fn royalty_bps(&self) -> RoyaltyBps {
        self.royalty_bps
    }

    pub fn consent_confirmed(&self) -> bool {
        self.consent_confirmed
    }

    pub fn total_earnings(&self) -> u64 {
        self.total_earnings
    }

    pub fn total_uses(&self) -> u32 {
        self.total_uses
    }

    /// Uses sold so far across all buyers (consumed or still prepaid).
    pub fn uses_sold(&self) -> u32 {
        self.max_uses.saturating_sub(self.remaining_uses)
    }

    /// Check the counter relations that must hold between any two operations.
    pub fn check_invariants(&self) -> DomainResult<()> {
        if !self.consent_confirmed {
            return Err(DomainError::invariant("license stored without creator consent"));
        }
        if self.remaining_uses > self.max_uses {
            return Err(DomainError::invariant("remaining uses exceed max uses"));
        }
        if self.total_uses > self.uses_sold() {
            return Err(DomainError::invariant("consumed uses exceed uses sold"));
        }
        Ok(())
    }

    pub(crate) fn record_sale(&mut self, remaining_uses: u32, total_earnings: u64) {
        self.remaining_uses = remaining_uses;
        self.total_earnings = total_earnings;
    }

    pub(crate) fn record_use(&mut self, total_uses: u32) {
        self.total_uses = total_uses;
    }
}

impl Entity for VoiceLicense {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.asset_id
    }
}
