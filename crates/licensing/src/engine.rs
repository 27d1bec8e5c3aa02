use std::borrow::Borrow;

use serde::Serialize;
use tracing::debug;

use echoledger_core::{ActorId, AssetId};

use crate::command::{BuyUsage, InitializeVoice, LicensingCommand, UseVoice};
use crate::error::LicensingError;
use crate::event::{LicensingEvent, UsagePurchased, VoiceInitialized, VoiceUsed};
use crate::funds::Funds;
use crate::license::{LicenseType, RoyaltyBps, VoiceLicense};
use crate::registry::{InMemoryLicenseRegistry, InMemoryUsageLedger, LicenseRegistry, UsageLedger};
use crate::usage::{UsageKey, UsageRecord};

/// Result of a successful state transition: the operation's value plus the
/// event describing what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    pub value: T,
    pub event: LicensingEvent,
}

/// Outcome of `buy_usage`: the buyer's updated record and what they paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub record: UsageRecord,
    pub payment: u64,
}

/// Read-only snapshot returned by `query_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseState {
    pub license: VoiceLicense,
    pub usage: Option<UsageRecord>,
}

/// Whether a holder may currently exercise a voice license, and on what terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseVerification {
    pub asset_id: AssetId,
    pub holder: ActorId,
    pub valid: bool,
    pub license_type: LicenseType,
    pub holder_remaining_uses: u32,
    pub license_remaining_uses: u32,
    pub max_uses: u32,
    pub creator: ActorId,
    pub ai_training_allowed: bool,
    pub attribution_required: bool,
}

/// The license & usage accounting engine.
///
/// Owns the license registry and the usage ledger and is the only writer of
/// either. Every mutating operation validates first, performs the funds
/// transfer (purchases only) as its last fallible step, and then applies the
/// resulting event. A failed call leaves records, counters and balances as
/// they were.
///
/// The engine holds no locks. The host must not run two calls against the
/// same asset at once.
#[derive(Debug, Clone, Default)]
pub struct AccountingEngine<R = InMemoryLicenseRegistry, L = InMemoryUsageLedger> {
    licenses: R,
    usage: L,
}

impl AccountingEngine {
    pub fn in_memory() -> Self {
        Self::default()
    }
}

impl<R, L> AccountingEngine<R, L>
where
    R: LicenseRegistry,
    L: UsageLedger,
{
    pub fn new(licenses: R, usage: L) -> Self {
        Self { licenses, usage }
    }

    pub fn licenses(&self) -> &R {
        &self.licenses
    }

    pub fn usage(&self) -> &L {
        &self.usage
    }

    pub fn initialize(
        &mut self,
        cmd: &InitializeVoice,
    ) -> Result<Transition<VoiceLicense>, LicensingError> {
        let event = LicensingEvent::VoiceInitialized(self.decide_initialize(cmd)?);
        self.apply(&event)?;
        let license = self.license(&cmd.asset_id)?.clone();
        debug!(asset_id = %cmd.asset_id, creator = %cmd.creator, "voice license initialized");
        Ok(Transition {
            value: license,
            event,
        })
    }

    pub fn buy_usage<F>(
        &mut self,
        cmd: &BuyUsage,
        funds: &mut F,
    ) -> Result<Transition<Purchase>, LicensingError>
    where
        F: Funds + ?Sized,
    {
        let purchased = self.decide_purchase(cmd)?;
        let payment = purchased.amount_paid;
        let event = self.settle(LicensingEvent::UsagePurchased(purchased), funds)?;
        let record = self.record(&UsageKey::new(cmd.asset_id, cmd.buyer))?.clone();
        debug!(
            asset_id = %cmd.asset_id,
            buyer = %cmd.buyer,
            uses = cmd.uses,
            payment,
            "usage purchased"
        );
        Ok(Transition {
            value: Purchase { record, payment },
            event,
        })
    }

    pub fn use_voice(&mut self, cmd: &UseVoice) -> Result<Transition<UsageRecord>, LicensingError> {
        let event = LicensingEvent::VoiceUsed(self.decide_use(cmd)?);
        self.apply(&event)?;
        let record = self.record(&UsageKey::new(cmd.asset_id, cmd.user))?.clone();
        debug!(
            asset_id = %cmd.asset_id,
            user = %cmd.user,
            remaining = record.remaining_uses(),
            "voice used"
        );
        Ok(Transition {
            value: record,
            event,
        })
    }

    /// Run any command; returns the event it produced.
    pub fn execute<F>(
        &mut self,
        cmd: &LicensingCommand,
        funds: &mut F,
    ) -> Result<LicensingEvent, LicensingError>
    where
        F: Funds + ?Sized,
    {
        match cmd {
            LicensingCommand::InitializeVoice(c) => self.initialize(c).map(|t| t.event),
            LicensingCommand::BuyUsage(c) => self.buy_usage(c, funds).map(|t| t.event),
            LicensingCommand::UseVoice(c) => self.use_voice(c).map(|t| t.event),
        }
    }

    pub fn query_state(
        &self,
        asset_id: &AssetId,
        buyer: Option<ActorId>,
    ) -> Result<LicenseState, LicensingError> {
        let license = self.license(asset_id)?.clone();
        let usage = buyer.and_then(|b| self.usage.get(&UsageKey::new(*asset_id, b)).cloned());
        Ok(LicenseState { license, usage })
    }

    /// Cost `buy_usage` would charge for `uses`, under the same checks.
    pub fn quote(&self, asset_id: &AssetId, uses: u32) -> Result<u64, LicensingError> {
        price_for(self.license(asset_id)?, uses)
    }

    pub fn verify_license(
        &self,
        asset_id: &AssetId,
        holder: ActorId,
    ) -> Result<LicenseVerification, LicensingError> {
        let license = self.license(asset_id)?;
        let held = self
            .usage
            .get(&UsageKey::new(*asset_id, holder))
            .map(UsageRecord::remaining_uses)
            .unwrap_or(0);
        let license_type = license.license_type();

        Ok(LicenseVerification {
            asset_id: *asset_id,
            holder,
            valid: held > 0,
            license_type,
            holder_remaining_uses: held,
            license_remaining_uses: license.remaining_uses(),
            max_uses: license.max_uses(),
            creator: license.creator(),
            ai_training_allowed: license_type.allows_ai_training(),
            attribution_required: license_type.requires_attribution(),
        })
    }

    /// Rebuild state from a journal of previously committed events.
    ///
    /// No funds move; purchases were settled when they were first committed.
    /// Stops at the first event that does not fit the state built so far,
    /// keeping everything applied before it.
    pub fn replay<I>(&mut self, events: I) -> Result<usize, LicensingError>
    where
        I: IntoIterator,
        I::Item: Borrow<LicensingEvent>,
    {
        let mut applied = 0;
        for event in events {
            self.apply(event.borrow())?;
            applied += 1;
        }
        Ok(applied)
    }

    fn license(&self, asset_id: &AssetId) -> Result<&VoiceLicense, LicensingError> {
        self.licenses.get(asset_id).ok_or(LicensingError::LicenseNotFound)
    }

    fn record(&self, key: &UsageKey) -> Result<&UsageRecord, LicensingError> {
        self.usage.get(key).ok_or(LicensingError::UsageRecordNotFound)
    }

    fn decide_initialize(&self, cmd: &InitializeVoice) -> Result<VoiceInitialized, LicensingError> {
        if self.licenses.contains(&cmd.asset_id) {
            return Err(LicensingError::AlreadyInitialized);
        }
        if !cmd.consent_confirmed {
            return Err(LicensingError::ConsentNotConfirmed);
        }
        if cmd.price_per_use == 0 {
            return Err(LicensingError::invalid("price per use must be greater than 0"));
        }
        if cmd.max_uses == 0 {
            return Err(LicensingError::invalid("max uses must be greater than 0"));
        }
        let royalty_bps = RoyaltyBps::new(cmd.royalty_bps)?;

        Ok(VoiceInitialized {
            asset_id: cmd.asset_id,
            creator: cmd.creator,
            price_per_use: cmd.price_per_use,
            max_uses: cmd.max_uses,
            license_type: cmd.license_type,
            resale_allowed: cmd.resale_allowed,
            royalty_bps,
            metadata: cmd.metadata.clone(),
            occurred_at: cmd.occurred_at,
        })
    }

    fn decide_purchase(&self, cmd: &BuyUsage) -> Result<UsagePurchased, LicensingError> {
        let license = self.license(&cmd.asset_id)?;
        let cost = price_for(license, cmd.uses)?;
        let total_earnings = license
            .total_earnings()
            .checked_add(cost)
            .ok_or(LicensingError::ArithmeticOverflow)?;

        let held = self
            .usage
            .get(&UsageKey::new(cmd.asset_id, cmd.buyer))
            .map(UsageRecord::remaining_uses)
            .unwrap_or(0);
        let buyer_remaining_uses = held
            .checked_add(cmd.uses)
            .ok_or(LicensingError::ArithmeticOverflow)?;

        Ok(UsagePurchased {
            asset_id: cmd.asset_id,
            buyer: cmd.buyer,
            creator: license.creator(),
            uses_purchased: cmd.uses,
            amount_paid: cost,
            // price_for guarantees uses <= remaining.
            license_remaining_uses: license.remaining_uses() - cmd.uses,
            buyer_remaining_uses,
            total_earnings,
            occurred_at: cmd.occurred_at,
        })
    }

    fn decide_use(&self, cmd: &UseVoice) -> Result<VoiceUsed, LicensingError> {
        let license = self.license(&cmd.asset_id)?;
        let record = self.record(&UsageKey::new(cmd.asset_id, cmd.user))?;
        if !record.has_uses() {
            return Err(LicensingError::NoUsesRemaining);
        }
        let total_uses = license
            .total_uses()
            .checked_add(1)
            .ok_or(LicensingError::ArithmeticOverflow)?;

        Ok(VoiceUsed {
            asset_id: cmd.asset_id,
            user: cmd.user,
            remaining_uses: record.remaining_uses() - 1,
            total_uses,
            occurred_at: cmd.occurred_at,
        })
    }

    /// Move funds for a decided purchase, then apply it.
    ///
    /// The transfer is the last step that may fail; `apply` cannot fail for an
    /// event that was just decided against the same state.
    fn settle<F>(
        &mut self,
        event: LicensingEvent,
        funds: &mut F,
    ) -> Result<LicensingEvent, LicensingError>
    where
        F: Funds + ?Sized,
    {
        if let LicensingEvent::UsagePurchased(e) = &event {
            funds
                .transfer(e.buyer, e.creator, e.amount_paid)
                .map_err(|err| LicensingError::InsufficientFunds(err.to_string()))?;
        }
        self.apply(&event)?;
        Ok(event)
    }

    /// Evolve state from one event.
    ///
    /// The event must follow from the current state: counters move by exactly
    /// the amounts it records and the license invariants hold afterwards. All
    /// checks happen before any write, so a rejected event leaves both tables
    /// untouched.
    fn apply(&mut self, event: &LicensingEvent) -> Result<(), LicensingError> {
        match event {
            LicensingEvent::VoiceInitialized(e) => {
                if self.licenses.contains(&e.asset_id) {
                    return Err(LicensingError::AlreadyInitialized);
                }
                if e.price_per_use == 0 || e.max_uses == 0 {
                    return Err(LicensingError::inconsistent("license terms out of range"));
                }
                let license = VoiceLicense::from_initialized(e);
                checked(&license)?;
                self.licenses.put(license);
            }
            LicensingEvent::UsagePurchased(e) => {
                let mut license = self.license(&e.asset_id)?.clone();
                if e.creator != license.creator() {
                    return Err(LicensingError::inconsistent("payee is not the creator"));
                }
                if price_for(&license, e.uses_purchased) != Ok(e.amount_paid) {
                    return Err(LicensingError::inconsistent("amount paid does not match price"));
                }
                if license.remaining_uses().checked_sub(e.uses_purchased)
                    != Some(e.license_remaining_uses)
                {
                    return Err(LicensingError::inconsistent("supply moved by the wrong amount"));
                }
                if license.total_earnings().checked_add(e.amount_paid) != Some(e.total_earnings) {
                    return Err(LicensingError::inconsistent("earnings moved by the wrong amount"));
                }

                let key = UsageKey::new(e.asset_id, e.buyer);
                let held = self
                    .usage
                    .get(&key)
                    .map(UsageRecord::remaining_uses)
                    .unwrap_or(0);
                if held.checked_add(e.uses_purchased) != Some(e.buyer_remaining_uses) {
                    return Err(LicensingError::inconsistent("buyer uses moved by wrong amount"));
                }

                license.record_sale(e.license_remaining_uses, e.total_earnings);
                checked(&license)?;
                self.licenses.put(license);
                self.usage.put(UsageRecord::new(key, e.buyer_remaining_uses));
            }
            LicensingEvent::VoiceUsed(e) => {
                let mut license = self.license(&e.asset_id)?.clone();
                let mut record = self.record(&UsageKey::new(e.asset_id, e.user))?.clone();
                if record.remaining_uses().checked_sub(1) != Some(e.remaining_uses) {
                    return Err(LicensingError::inconsistent("use did not consume exactly one use"));
                }
                if license.total_uses().checked_add(1) != Some(e.total_uses) {
                    return Err(LicensingError::inconsistent("use count moved by the wrong amount"));
                }

                license.record_use(e.total_uses);
                checked(&license)?;
                record.set_remaining_uses(e.remaining_uses);
                self.licenses.put(license);
                self.usage.put(record);
            }
        }
        Ok(())
    }
}

fn checked(license: &VoiceLicense) -> Result<(), LicensingError> {
    license
        .check_invariants()
        .map_err(|err| LicensingError::inconsistent(err.to_string()))
}

fn price_for(license: &VoiceLicense, uses: u32) -> Result<u64, LicensingError> {
    if uses == 0 {
        return Err(LicensingError::invalid("uses to buy must be greater than 0"));
    }
    if uses > license.remaining_uses() {
        return Err(LicensingError::InsufficientSupply {
            requested: uses,
            available: license.remaining_uses(),
        });
    }
    license
        .price_per_use()
        .checked_mul(u64::from(uses))
        .ok_or(LicensingError::ArithmeticOverflow)
}
