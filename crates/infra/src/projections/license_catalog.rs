use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use echoledger_core::{ActorId, AssetId};
use echoledger_events::EventEnvelope;
use echoledger_licensing::{LicenseType, LicensingEvent};

use crate::read_model::KeyedStore;

/// Catalog entry for one voice asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub asset_id: AssetId,
    pub creator: ActorId,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
    pub license_type: LicenseType,
    pub price_per_use: u64,
    pub max_uses: u32,
    pub remaining_uses: u32,
    pub total_uses: u32,
    pub total_earnings: u64,
    pub purchases: u64,
}

/// Earnings of one creator across all of their assets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatorEarnings {
    pub creator: ActorId,
    pub assets: u32,
    pub uses_sold: u64,
    pub total_earnings: u64,
}

#[derive(Debug, Error)]
pub enum CatalogProjectionError {
    #[error("failed to deserialize licensing event: {0}")]
    Deserialize(String),

    #[error("event asset does not match its stream: {0}")]
    StreamMismatch(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("event for unknown asset {0}")]
    UnknownAsset(AssetId),

    #[error("catalog cursor lock poisoned")]
    Poisoned,
}

/// Read-side catalog built from published ledger events.
///
/// Never consulted by the engine. Idempotent per asset stream: envelopes at
/// or below the stream cursor are ignored.
#[derive(Debug)]
pub struct LicenseCatalogProjection<C, E>
where
    C: KeyedStore<AssetId, LicenseSummary>,
    E: KeyedStore<ActorId, CreatorEarnings>,
{
    catalog: C,
    earnings: E,
    cursors: RwLock<HashMap<AssetId, u64>>,
}

impl<C, E> LicenseCatalogProjection<C, E>
where
    C: KeyedStore<AssetId, LicenseSummary>,
    E: KeyedStore<ActorId, CreatorEarnings>,
{
    pub fn new(catalog: C, earnings: E) -> Self {
        Self {
            catalog,
            earnings,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, asset_id: &AssetId) -> Option<LicenseSummary> {
        self.catalog.get(asset_id)
    }

    pub fn list(&self) -> Vec<LicenseSummary> {
        self.catalog.list()
    }

    pub fn earnings_of(&self, creator: &ActorId) -> Option<CreatorEarnings> {
        self.earnings.get(creator)
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), CatalogProjectionError> {
        let asset_id = envelope.stream_id();
        let seq = envelope.sequence_number();

        let mut cursors = self
            .cursors
            .write()
            .map_err(|_| CatalogProjectionError::Poisoned)?;
        let last = cursors.get(&asset_id).copied().unwrap_or(0);

        if seq == 0 {
            return Err(CatalogProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if last != 0 && seq != last + 1 {
            return Err(CatalogProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let event: LicensingEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| CatalogProjectionError::Deserialize(e.to_string()))?;

        if event.asset_id() != asset_id {
            return Err(CatalogProjectionError::StreamMismatch(format!(
                "event asset {} on stream {}",
                event.asset_id(),
                asset_id
            )));
        }

        self.apply(event)?;
        cursors.insert(asset_id, seq);
        Ok(())
    }

    /// Clear everything and replay `envelopes` in (asset, sequence) order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), CatalogProjectionError> {
        self.cursors
            .write()
            .map_err(|_| CatalogProjectionError::Poisoned)?
            .clear();
        self.catalog.clear();
        self.earnings.clear();

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (e.stream_id(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }

    fn apply(&self, event: LicensingEvent) -> Result<(), CatalogProjectionError> {
        match event {
            LicensingEvent::VoiceInitialized(e) => {
                let metadata = e.metadata.unwrap_or_default();
                let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
                self.catalog.upsert(
                    e.asset_id,
                    LicenseSummary {
                        asset_id: e.asset_id,
                        creator: e.creator,
                        name: non_empty(metadata.name),
                        symbol: non_empty(metadata.symbol),
                        uri: non_empty(metadata.uri),
                        license_type: e.license_type,
                        price_per_use: e.price_per_use,
                        max_uses: e.max_uses,
                        remaining_uses: e.max_uses,
                        total_uses: 0,
                        total_earnings: 0,
                        purchases: 0,
                    },
                );

                let mut earnings = self.creator_earnings(e.creator);
                earnings.assets += 1;
                self.earnings.upsert(e.creator, earnings);
            }
            LicensingEvent::UsagePurchased(e) => {
                let mut summary = self
                    .catalog
                    .get(&e.asset_id)
                    .ok_or(CatalogProjectionError::UnknownAsset(e.asset_id))?;
                summary.remaining_uses = e.license_remaining_uses;
                summary.total_earnings = e.total_earnings;
                summary.purchases += 1;
                self.catalog.upsert(e.asset_id, summary);

                let mut earnings = self.creator_earnings(e.creator);
                earnings.uses_sold += u64::from(e.uses_purchased);
                earnings.total_earnings = earnings.total_earnings.saturating_add(e.amount_paid);
                self.earnings.upsert(e.creator, earnings);
            }
            LicensingEvent::VoiceUsed(e) => {
                let mut summary = self
                    .catalog
                    .get(&e.asset_id)
                    .ok_or(CatalogProjectionError::UnknownAsset(e.asset_id))?;
                summary.total_uses = e.total_uses;
                self.catalog.upsert(e.asset_id, summary);
            }
        }
        Ok(())
    }

    fn creator_earnings(&self, creator: ActorId) -> CreatorEarnings {
        self.earnings.get(&creator).unwrap_or(CreatorEarnings {
            creator,
            ..CreatorEarnings::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::InMemoryKeyedStore;
    use chrono::Utc;
    use echoledger_licensing::{
        RoyaltyBps, UsagePurchased, VoiceInitialized, VoiceMetadata, VoiceUsed,
    };
    use uuid::Uuid;

    type Catalog = LicenseCatalogProjection<
        InMemoryKeyedStore<AssetId, LicenseSummary>,
        InMemoryKeyedStore<ActorId, CreatorEarnings>,
    >;

    fn projection() -> Catalog {
        LicenseCatalogProjection::new(InMemoryKeyedStore::new(), InMemoryKeyedStore::new())
    }

    fn envelope(seq: u64, event: &LicensingEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            event.asset_id(),
            "licensing.voice",
            seq,
            serde_json::to_value(event).unwrap(),
        )
    }

    fn history(asset_id: AssetId, creator: ActorId, buyer: ActorId) -> Vec<LicensingEvent> {
        vec![
            LicensingEvent::VoiceInitialized(VoiceInitialized {
                asset_id,
                creator,
                price_per_use: 10,
                max_uses: 100,
                license_type: LicenseType::Personal,
                resale_allowed: false,
                royalty_bps: RoyaltyBps::new(250).unwrap(),
                metadata: Some(VoiceMetadata {
                    name: "Narrator".to_string(),
                    symbol: "NAR".to_string(),
                    uri: String::new(),
                }),
                occurred_at: Utc::now(),
            }),
            LicensingEvent::UsagePurchased(UsagePurchased {
                asset_id,
                buyer,
                creator,
                uses_purchased: 3,
                amount_paid: 30,
                license_remaining_uses: 97,
                buyer_remaining_uses: 3,
                total_earnings: 30,
                occurred_at: Utc::now(),
            }),
            LicensingEvent::VoiceUsed(VoiceUsed {
                asset_id,
                user: buyer,
                remaining_uses: 2,
                total_uses: 1,
                occurred_at: Utc::now(),
            }),
        ]
    }

    #[test]
    fn builds_summary_and_creator_earnings() {
        let p = projection();
        let (asset, creator, buyer) = (AssetId::new(), ActorId::new(), ActorId::new());

        for (i, e) in history(asset, creator, buyer).iter().enumerate() {
            p.apply_envelope(&envelope(i as u64 + 1, e)).unwrap();
        }

        let summary = p.get(&asset).unwrap();
        assert_eq!(summary.name.as_deref(), Some("Narrator"));
        assert_eq!(summary.uri, None);
        assert_eq!(summary.remaining_uses, 97);
        assert_eq!(summary.total_uses, 1);
        assert_eq!(summary.purchases, 1);

        let earnings = p.earnings_of(&creator).unwrap();
        assert_eq!(earnings.assets, 1);
        assert_eq!(earnings.uses_sold, 3);
        assert_eq!(earnings.total_earnings, 30);
    }

    #[test]
    fn redelivered_envelopes_are_ignored() {
        let p = projection();
        let (asset, creator, buyer) = (AssetId::new(), ActorId::new(), ActorId::new());
        let events = history(asset, creator, buyer);

        p.apply_envelope(&envelope(1, &events[0])).unwrap();
        p.apply_envelope(&envelope(2, &events[1])).unwrap();
        p.apply_envelope(&envelope(2, &events[1])).unwrap();
        p.apply_envelope(&envelope(1, &events[0])).unwrap();

        assert_eq!(p.earnings_of(&creator).unwrap().total_earnings, 30);
        assert_eq!(p.earnings_of(&creator).unwrap().assets, 1);
    }

    #[test]
    fn gaps_and_foreign_streams_are_rejected() {
        let p = projection();
        let (asset, creator, buyer) = (AssetId::new(), ActorId::new(), ActorId::new());
        let events = history(asset, creator, buyer);

        p.apply_envelope(&envelope(1, &events[0])).unwrap();
        assert!(matches!(
            p.apply_envelope(&envelope(3, &events[2])),
            Err(CatalogProjectionError::NonMonotonicSequence { last: 1, found: 3 })
        ));

        let foreign = EventEnvelope::new(
            Uuid::now_v7(),
            AssetId::new(),
            "licensing.voice",
            1,
            serde_json::to_value(&events[0]).unwrap(),
        );
        assert!(matches!(
            p.apply_envelope(&foreign),
            Err(CatalogProjectionError::StreamMismatch(_))
        ));
    }

    #[test]
    fn rebuild_matches_incremental_state() {
        let p = projection();
        let (asset, creator, buyer) = (AssetId::new(), ActorId::new(), ActorId::new());
        let envs: Vec<_> = history(asset, creator, buyer)
            .iter()
            .enumerate()
            .map(|(i, e)| envelope(i as u64 + 1, e))
            .collect();

        for env in &envs {
            p.apply_envelope(env).unwrap();
        }
        let incremental = (p.get(&asset), p.earnings_of(&creator));

        p.rebuild_from_scratch(envs.into_iter().rev()).unwrap();

        assert_eq!((p.get(&asset), p.earnings_of(&creator)), incremental);
    }

    #[test]
    fn poisoned_cursor_lock_surfaces_as_an_error() {
        let p = projection();
        let (asset, creator, buyer) = (AssetId::new(), ActorId::new(), ActorId::new());
        let events = history(asset, creator, buyer);

        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _held = p.cursors.write().unwrap();
                panic!("worker died holding the cursor lock");
            });
            assert!(poisoner.join().is_err());
        });

        assert!(matches!(
            p.apply_envelope(&envelope(1, &events[0])),
            Err(CatalogProjectionError::Poisoned)
        ));
        assert!(matches!(
            p.rebuild_from_scratch(vec![envelope(1, &events[0])]),
            Err(CatalogProjectionError::Poisoned)
        ));
        assert_eq!(p.get(&asset), None);
    }
}
