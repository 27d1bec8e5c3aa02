use serde::{Deserialize, Serialize};

use echoledger_core::{ActorId, AssetId};
use echoledger_licensing::{
    LicenseType, LicensingError, Purchase, UsageRecord, VoiceLicense, VoiceMetadata,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateLicenseRequest {
    /// Generated when absent.
    pub asset_id: Option<String>,
    pub price_per_use: u64,
    pub max_uses: u32,
    pub license_type: LicenseTypeInput,
    #[serde(default)]
    pub resale_allowed: bool,
    #[serde(default)]
    pub royalty_bps: u16,
    #[serde(default)]
    pub consent_confirmed: bool,
    pub metadata: Option<VoiceMetadata>,
}

/// License type as a name (`"personal"`) or as its wire code (`0`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum LicenseTypeInput {
    Code(u8),
    Name(LicenseType),
}

impl LicenseTypeInput {
    pub fn resolve(self) -> Result<LicenseType, LicensingError> {
        match self {
            LicenseTypeInput::Code(code) => LicenseType::from_code(code),
            LicenseTypeInput::Name(license_type) => Ok(license_type),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub uses: u32,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    pub buyer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub uses: u32,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Defaults to the caller.
    pub holder: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LicenseResponse {
    pub asset_id: AssetId,
    pub creator: ActorId,
    pub price_per_use: u64,
    pub max_uses: u32,
    pub remaining_uses: u32,
    pub uses_sold: u32,
    pub license_type: LicenseType,
    pub license_type_code: u8,
    pub resale_allowed: bool,
    pub royalty_bps: u16,
    pub total_earnings: u64,
    pub total_uses: u32,
}

impl From<&VoiceLicense> for LicenseResponse {
    fn from(l: &VoiceLicense) -> Self {
        Self {
            asset_id: l.asset_id(),
            creator: l.creator(),
            price_per_use: l.price_per_use(),
            max_uses: l.max_uses(),
            remaining_uses: l.remaining_uses(),
            uses_sold: l.uses_sold(),
            license_type: l.license_type(),
            license_type_code: l.license_type().code(),
            resale_allowed: l.resale_allowed(),
            royalty_bps: l.royalty_bps().get(),
            total_earnings: l.total_earnings(),
            total_uses: l.total_uses(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub asset_id: AssetId,
    pub buyer: ActorId,
    pub remaining_uses: u32,
}

impl From<&UsageRecord> for UsageResponse {
    fn from(r: &UsageRecord) -> Self {
        Self {
            asset_id: r.asset_id(),
            buyer: r.buyer(),
            remaining_uses: r.remaining_uses(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LicenseStateResponse {
    pub license: LicenseResponse,
    pub usage: Option<UsageResponse>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub payment: u64,
    pub usage: UsageResponse,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(p: &Purchase) -> Self {
        Self {
            payment: p.payment,
            usage: UsageResponse::from(&p.record),
        }
    }
}

/// Body of a granted use: the caller may now run the gated feature once.
#[derive(Debug, Serialize)]
pub struct UseGrantResponse {
    pub granted: bool,
    pub asset_id: AssetId,
    pub user: ActorId,
    pub remaining_uses: u32,
}

// -------------------------
// Path/query helpers
// -------------------------

pub fn parse_asset_id(raw: &str) -> Result<AssetId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("asset"))
}

pub fn parse_actor_id(raw: &str) -> Result<ActorId, axum::response::Response> {
    raw.parse().map_err(|_| errors::invalid_id("actor"))
}
