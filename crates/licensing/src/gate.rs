//! Usage gating for features that must consume a prepaid use.

use crate::command::UseVoice;
use crate::engine::{AccountingEngine, Transition};
use crate::error::LicensingError;
use crate::registry::{LicenseRegistry, UsageLedger};
use crate::usage::UsageRecord;

/// Consume one use, then run `action`.
///
/// The use is recorded before the action runs and is not refunded if the
/// action's own outcome is unwanted. On any denial `action` never runs; a
/// `NoUsesRemaining` denial is absolute and should lead the caller to purchase
/// more uses, not to retry.
pub fn run_gated<R, L, T>(
    engine: &mut AccountingEngine<R, L>,
    cmd: &UseVoice,
    action: impl FnOnce(&UsageRecord) -> T,
) -> Result<Transition<T>, LicensingError>
where
    R: LicenseRegistry,
    L: UsageLedger,
{
    let used = engine.use_voice(cmd)?;
    let value = action(&used.value);
    Ok(Transition {
        value,
        event: used.event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BuyUsage, InitializeVoice};
    use crate::funds::InMemoryBalances;
    use crate::license::LicenseType;
    use chrono::Utc;
    use echoledger_core::{ActorId, AssetId};

    fn licensed_engine(uses: u32) -> (AccountingEngine, AssetId, ActorId) {
        let mut engine = AccountingEngine::in_memory();
        let mut funds = InMemoryBalances::new();
        let (asset_id, creator, user) = (AssetId::new(), ActorId::new(), ActorId::new());
        funds.deposit(user, 100).unwrap();

        engine
            .initialize(&InitializeVoice {
                asset_id,
                creator,
                price_per_use: 1,
                max_uses: 10,
                license_type: LicenseType::Personal,
                resale_allowed: false,
                royalty_bps: 0,
                consent_confirmed: true,
                metadata: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
        if uses > 0 {
            engine
                .buy_usage(
                    &BuyUsage {
                        asset_id,
                        buyer: user,
                        uses,
                        occurred_at: Utc::now(),
                    },
                    &mut funds,
                )
                .unwrap();
        }
        (engine, asset_id, user)
    }

    fn use_cmd(asset_id: AssetId, user: ActorId) -> UseVoice {
        UseVoice {
            asset_id,
            user,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn action_runs_after_use_is_recorded() {
        let (mut engine, asset, user) = licensed_engine(2);

        let t = run_gated(&mut engine, &use_cmd(asset, user), |record| {
            format!("generated with {} uses left", record.remaining_uses())
        })
        .unwrap();

        assert_eq!(t.value, "generated with 1 uses left");
        let state = engine.query_state(&asset, Some(user)).unwrap();
        assert_eq!(state.usage.map(|r| r.remaining_uses()), Some(1));
    }

    #[test]
    fn exhausted_balance_blocks_the_action() {
        let (mut engine, asset, user) = licensed_engine(1);
        let mut runs = 0;

        run_gated(&mut engine, &use_cmd(asset, user), |_| runs += 1).unwrap();
        let err = run_gated(&mut engine, &use_cmd(asset, user), |_| runs += 1).unwrap_err();

        assert_eq!(err, LicensingError::NoUsesRemaining);
        assert!(err.is_absolute_denial());
        assert_eq!(runs, 1);
    }

    #[test]
    fn missing_record_blocks_the_action() {
        let (mut engine, asset, _) = licensed_engine(0);
        let mut ran = false;

        let err = run_gated(&mut engine, &use_cmd(asset, ActorId::new()), |_| ran = true)
            .unwrap_err();

        assert_eq!(err, LicensingError::UsageRecordNotFound);
        assert!(!ran);
    }
}
