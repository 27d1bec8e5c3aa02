use serde::{Deserialize, Serialize};

use echoledger_core::{ActorId, AssetId, Entity};

/// Composite key of the usage ledger: one record per (asset, buyer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsageKey {
    pub asset_id: AssetId,
    pub buyer: ActorId,
}

impl UsageKey {
    pub fn new(asset_id: AssetId, buyer: ActorId) -> Self {
        Self { asset_id, buyer }
    }
}

/// A buyer's prepaid, not-yet-consumed uses of one voice asset.
///
/// Created on the buyer's first purchase, never deleted. A record at zero
/// stays in place and can be topped up by later purchases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    key: UsageKey,
    remaining_uses: u32,
}

impl UsageRecord {
    pub(crate) fn new(key: UsageKey, remaining_uses: u32) -> Self {
        Self {
            key,
            remaining_uses,
        }
    }

    pub fn key(&self) -> UsageKey {
        self.key
    }

    pub fn asset_id(&self) -> AssetId {
        self.key.asset_id
    }

    pub fn buyer(&self) -> ActorId {
        self.key.buyer
    }

    pub fn remaining_uses(&self) -> u32 {
        self.remaining_uses
    }

    pub fn has_uses(&self) -> bool {
        self.remaining_uses > 0
    }

    pub(crate) fn set_remaining_uses(&mut self, remaining_uses: u32) {
        self.remaining_uses = remaining_uses;
    }
}

impl Entity for UsageRecord {
    type Id = UsageKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}
