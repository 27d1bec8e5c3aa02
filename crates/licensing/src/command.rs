use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use echoledger_core::{ActorId, AssetId};
use echoledger_events::Command;

use crate::license::{LicenseType, VoiceMetadata};

/// Command: register a voice asset with its license terms.
///
/// `royalty_bps` arrives raw and is validated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeVoice {
    pub asset_id: AssetId,
    pub creator: ActorId,
    pub price_per_use: u64,
    pub max_uses: u32,
    pub license_type: LicenseType,
    pub resale_allowed: bool,
    pub royalty_bps: u16,
    pub consent_confirmed: bool,
    #[serde(default)]
    pub metadata: Option<VoiceMetadata>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: buyer prepays `uses` uses of an asset for themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyUsage {
    pub asset_id: AssetId,
    pub buyer: ActorId,
    pub uses: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: consume one prepaid use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseVoice {
    pub asset_id: AssetId,
    pub user: ActorId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicensingCommand {
    InitializeVoice(InitializeVoice),
    BuyUsage(BuyUsage),
    UseVoice(UseVoice),
}

impl LicensingCommand {
    /// The actor the identity layer must have authenticated for this command.
    pub fn actor(&self) -> ActorId {
        match self {
            LicensingCommand::InitializeVoice(c) => c.creator,
            LicensingCommand::BuyUsage(c) => c.buyer,
            LicensingCommand::UseVoice(c) => c.user,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LicensingCommand::InitializeVoice(_) => "initialize_voice",
            LicensingCommand::BuyUsage(_) => "buy_usage",
            LicensingCommand::UseVoice(_) => "use_voice",
        }
    }
}

impl Command for LicensingCommand {
    fn target_asset_id(&self) -> AssetId {
        match self {
            LicensingCommand::InitializeVoice(c) => c.asset_id,
            LicensingCommand::BuyUsage(c) => c.asset_id,
            LicensingCommand::UseVoice(c) => c.asset_id,
        }
    }
}
