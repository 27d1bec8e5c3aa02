//! Ledger host: runs the accounting engine one call at a time and journals
//! and publishes what it commits.
//!
//! ```text
//! call → lock → engine on a draft (validate, transfer, apply) → journal append
//!      → swap draft in → publish → unlock
//! ```
//!
//! Nothing becomes visible until the journal accepts the event, so a call that
//! fails leaves licenses, usage records and balances as they were. Publication
//! happens after commit; a failed publish is logged and does not fail the call,
//! since the event is already journaled and consumers can rebuild from it.
//!
//! The lock is held through publication so consumers see each asset's events
//! in commit order.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use echoledger_core::{ActorId, AssetId, ExpectedVersion};
use echoledger_events::{EventBus, EventEnvelope};
use echoledger_licensing::{
    AccountingEngine, BuyUsage, FundsError, InMemoryBalances, InitializeVoice, LicenseRegistry,
    LicenseState, LicenseVerification, LicensingCommand, LicensingError, LicensingEvent, Purchase,
    Transition, UsageRecord, UseVoice, VoiceLicense,
};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// Stream type recorded on every journaled licensing event.
pub const LICENSE_STREAM_TYPE: &str = "licensing.voice";

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Licensing(#[from] LicensingError),

    #[error("event store: {0}")]
    Store(#[from] EventStoreError),

    #[error("journaled event could not be decoded: {0}")]
    Deserialize(String),

    #[error("funding rejected: {0}")]
    Funding(#[from] FundsError),

    #[error("ledger state lock poisoned")]
    Poisoned,
}

impl HostError {
    /// The engine's error, when the call was refused by the ledger itself.
    pub fn licensing(&self) -> Option<&LicensingError> {
        match self {
            HostError::Licensing(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    engine: AccountingEngine,
    funds: InMemoryBalances,
}

/// Process-local owner of the engine, its balances, the journal and the bus.
pub struct LedgerHost<S, B> {
    state: Mutex<LedgerState>,
    store: S,
    bus: B,
}

impl<S, B> LedgerHost<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// A host over an empty ledger. The journal is not read.
    pub fn new(store: S, bus: B) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            store,
            bus,
        }
    }

    /// Rebuild licenses and usage records from the journal.
    ///
    /// Every event is checked against the state rebuilt so far. Balances are
    /// not journaled and start empty; nothing is republished.
    pub fn rehydrate(store: S, bus: B) -> Result<Self, HostError> {
        let stored = store.load_all()?;
        let events = stored
            .iter()
            .map(|e| {
                serde_json::from_value::<LicensingEvent>(e.payload.clone()).map_err(|err| {
                    HostError::Deserialize(format!("{} #{}: {err}", e.stream_id, e.sequence_number))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut engine = AccountingEngine::in_memory();
        let applied = engine.replay(&events)?;
        info!(
            events = applied,
            licenses = engine.licenses().len(),
            "ledger rehydrated from journal"
        );

        Ok(Self {
            state: Mutex::new(LedgerState {
                engine,
                funds: InMemoryBalances::new(),
            }),
            store,
            bus,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn initialize(&self, cmd: &InitializeVoice) -> Result<VoiceLicense, HostError> {
        self.run("initialize", cmd.asset_id, cmd.creator, |s| {
            s.engine.initialize(cmd)
        })
    }

    pub fn buy_usage(&self, cmd: &BuyUsage) -> Result<Purchase, HostError> {
        self.run("buy_usage", cmd.asset_id, cmd.buyer, |s| {
            s.engine.buy_usage(cmd, &mut s.funds)
        })
    }

    pub fn use_voice(&self, cmd: &UseVoice) -> Result<UsageRecord, HostError> {
        self.run("use_voice", cmd.asset_id, cmd.user, |s| {
            s.engine.use_voice(cmd)
        })
    }

    /// Consume one use and run `action` while the ledger is still locked.
    ///
    /// The action runs only once the use is journaled, so it never runs for a
    /// use that was not recorded.
    pub fn gated<T>(
        &self,
        cmd: &UseVoice,
        action: impl FnOnce(&UsageRecord) -> T,
    ) -> Result<T, HostError> {
        let (_guard, record) = self.commit("gated_use", cmd.asset_id, cmd.user, |s| {
            s.engine.use_voice(cmd)
        })?;
        Ok(action(&record))
    }

    /// Run any command; returns the event it committed.
    pub fn execute(&self, cmd: &LicensingCommand) -> Result<LicensingEvent, HostError> {
        use echoledger_events::Command;

        self.run(cmd.name(), cmd.target_asset_id(), cmd.actor(), |s| {
            s.engine.execute(cmd, &mut s.funds).map(|event| Transition {
                value: event.clone(),
                event,
            })
        })
    }

    pub fn query_state(
        &self,
        asset_id: &AssetId,
        buyer: Option<ActorId>,
    ) -> Result<LicenseState, HostError> {
        Ok(self.lock()?.engine.query_state(asset_id, buyer)?)
    }

    pub fn quote(&self, asset_id: &AssetId, uses: u32) -> Result<u64, HostError> {
        Ok(self.lock()?.engine.quote(asset_id, uses)?)
    }

    pub fn verify_license(
        &self,
        asset_id: &AssetId,
        holder: ActorId,
    ) -> Result<LicenseVerification, HostError> {
        Ok(self.lock()?.engine.verify_license(asset_id, holder)?)
    }

    /// Credit an actor's balance from outside the ledger.
    pub fn deposit(&self, actor: ActorId, amount: u64) -> Result<u64, HostError> {
        let balance = self.lock()?.funds.deposit(actor, amount)?;
        info!(%actor, amount, balance, "balance funded");
        Ok(balance)
    }

    pub fn balance_of(&self, actor: ActorId) -> Result<u64, HostError> {
        Ok(self.lock()?.funds.balance_of(actor))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, HostError> {
        self.state.lock().map_err(|_| HostError::Poisoned)
    }

    fn run<T>(
        &self,
        op: &'static str,
        asset_id: AssetId,
        actor: ActorId,
        call: impl FnOnce(&mut LedgerState) -> Result<Transition<T>, LicensingError>,
    ) -> Result<T, HostError> {
        self.commit(op, asset_id, actor, call).map(|(_, value)| value)
    }

    /// Decide on a draft of the state, journal the event, then swap the draft
    /// in and publish. Returns the guard so callers can act before unlocking.
    fn commit<T>(
        &self,
        op: &'static str,
        asset_id: AssetId,
        actor: ActorId,
        call: impl FnOnce(&mut LedgerState) -> Result<Transition<T>, LicensingError>,
    ) -> Result<(MutexGuard<'_, LedgerState>, T), HostError> {
        let mut state = self.lock()?;
        let mut draft = state.clone();

        let transition = call(&mut draft).map_err(|err| {
            warn!(op, %asset_id, %actor, kind = err.kind(), error = %err, "licensing call denied");
            err
        })?;

        let stored = self.journal(&transition.event).map_err(|err| {
            error!(op, %asset_id, %actor, error = %err, "event not journaled; call rolled back");
            err
        })?;
        *state = draft;

        if let Err(err) = self.bus.publish(stored.to_envelope()) {
            error!(
                op,
                %asset_id,
                sequence = stored.sequence_number,
                error = ?err,
                "committed event was not published"
            );
        }

        info!(
            op,
            %asset_id,
            %actor,
            sequence = stored.sequence_number,
            "licensing call committed"
        );
        Ok((state, transition.value))
    }

    fn journal(&self, event: &LicensingEvent) -> Result<StoredEvent, HostError> {
        let asset_id = event.asset_id();
        let version = self.store.stream_version(asset_id)?;
        let uncommitted =
            UncommittedEvent::from_typed(asset_id, LICENSE_STREAM_TYPE, Uuid::now_v7(), event)?;

        let mut committed = self
            .store
            .append(vec![uncommitted], ExpectedVersion::Exact(version))?;
        let stored = committed.pop().ok_or_else(|| {
            EventStoreError::InvalidAppend("append returned no events".to_string())
        })?;
        Ok(stored)
    }
}
