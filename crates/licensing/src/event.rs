use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use echoledger_core::{ActorId, AssetId};
use echoledger_events::Event;

use crate::license::{LicenseType, RoyaltyBps, VoiceMetadata};

/// Event: VoiceInitialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInitialized {
    pub asset_id: AssetId,
    pub creator: ActorId,
    pub price_per_use: u64,
    pub max_uses: u32,
    pub license_type: LicenseType,
    pub resale_allowed: bool,
    pub royalty_bps: RoyaltyBps,
    pub metadata: Option<VoiceMetadata>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: UsagePurchased.
///
/// Carries the post-purchase counters so applying it needs no arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePurchased {
    pub asset_id: AssetId,
    pub buyer: ActorId,
    pub creator: ActorId,
    pub uses_purchased: u32,
    pub amount_paid: u64,
    pub license_remaining_uses: u32,
    pub buyer_remaining_uses: u32,
    pub total_earnings: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VoiceUsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceUsed {
    pub asset_id: AssetId,
    pub user: ActorId,
    pub remaining_uses: u32,
    pub total_uses: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicensingEvent {
    VoiceInitialized(VoiceInitialized),
    UsagePurchased(UsagePurchased),
    VoiceUsed(VoiceUsed),
}

impl LicensingEvent {
    pub fn asset_id(&self) -> AssetId {
        match self {
            LicensingEvent::VoiceInitialized(e) => e.asset_id,
            LicensingEvent::UsagePurchased(e) => e.asset_id,
            LicensingEvent::VoiceUsed(e) => e.asset_id,
        }
    }
}

impl Event for LicensingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LicensingEvent::VoiceInitialized(_) => "licensing.voice.initialized",
            LicensingEvent::UsagePurchased(_) => "licensing.usage.purchased",
            LicensingEvent::VoiceUsed(_) => "licensing.voice.used",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LicensingEvent::VoiceInitialized(e) => e.occurred_at,
            LicensingEvent::UsagePurchased(e) => e.occurred_at,
            LicensingEvent::VoiceUsed(e) => e.occurred_at,
        }
    }
}
