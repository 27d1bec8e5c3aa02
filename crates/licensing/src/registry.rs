//! Keyed storage for the two ledger tables.
//!
//! The engine only talks to [`LicenseRegistry`] and [`UsageLedger`]; both are
//! keyed lookups (O(1) for the in-memory [`EntityTable`]). Writes are
//! infallible so the engine can finish a transition once its fallible steps
//! have succeeded.

use std::collections::HashMap;

use echoledger_core::{AssetId, Entity};

use crate::license::VoiceLicense;
use crate::usage::{UsageKey, UsageRecord};

/// Authoritative `VoiceLicense` per asset.
pub trait LicenseRegistry {
    fn get(&self, asset_id: &AssetId) -> Option<&VoiceLicense>;

    /// Insert or replace the license stored under its asset id.
    fn put(&mut self, license: VoiceLicense);

    fn contains(&self, asset_id: &AssetId) -> bool {
        self.get(asset_id).is_some()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One `UsageRecord` per (asset, buyer).
pub trait UsageLedger {
    fn get(&self, key: &UsageKey) -> Option<&UsageRecord>;

    /// Insert or replace the record stored under its key.
    fn put(&mut self, record: UsageRecord);

    /// All records held for one asset, in no particular order.
    fn records_for(&self, asset_id: &AssetId) -> Vec<&UsageRecord>;
}

/// In-memory keyed table of entities.
#[derive(Debug, Clone)]
pub struct EntityTable<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> EntityTable<E> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }
}

impl<E: Entity> Default for EntityTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub type InMemoryLicenseRegistry = EntityTable<VoiceLicense>;
pub type InMemoryUsageLedger = EntityTable<UsageRecord>;

impl LicenseRegistry for EntityTable<VoiceLicense> {
    fn get(&self, asset_id: &AssetId) -> Option<&VoiceLicense> {
        self.rows.get(asset_id)
    }

    fn put(&mut self, license: VoiceLicense) {
        self.rows.insert(license.id().clone(), license);
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

impl UsageLedger for EntityTable<UsageRecord> {
    fn get(&self, key: &UsageKey) -> Option<&UsageRecord> {
        self.rows.get(key)
    }

    fn put(&mut self, record: UsageRecord) {
        self.rows.insert(record.id().clone(), record);
    }

    fn records_for(&self, asset_id: &AssetId) -> Vec<&UsageRecord> {
        self.rows
            .values()
            .filter(|r| r.asset_id() == *asset_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echoledger_core::ActorId;

    #[test]
    fn usage_records_are_keyed_by_asset_and_buyer() {
        let mut ledger = InMemoryUsageLedger::new();
        let asset = AssetId::new();
        let alice = ActorId::new();
        let bob = ActorId::new();

        ledger.put(UsageRecord::new(UsageKey::new(asset, alice), 3));
        ledger.put(UsageRecord::new(UsageKey::new(asset, bob), 1));
        ledger.put(UsageRecord::new(UsageKey::new(asset, alice), 2));

        assert_eq!(ledger.get(&UsageKey::new(asset, alice)).unwrap().remaining_uses(), 2);
        assert_eq!(ledger.records_for(&asset).len(), 2);
        assert!(ledger.records_for(&AssetId::new()).is_empty());
    }
}
