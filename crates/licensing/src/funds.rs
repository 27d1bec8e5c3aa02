//! Balance layer boundary.
//!
//! The ledger does not hold money itself. `buy_usage` asks a [`Funds`]
//! implementation to move the purchase cost from buyer to creator exactly once
//! and treats any failure as insufficient funds.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use echoledger_core::ActorId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FundsError {
    #[error("balance {available} is below required {required}")]
    Insufficient { available: u64, required: u64 },

    #[error("recipient balance would overflow")]
    Overflow,

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Value transfer between actors. Either the whole amount moves or nothing does.
pub trait Funds {
    fn transfer(&mut self, from: ActorId, to: ActorId, amount: u64) -> Result<(), FundsError>;
}

/// In-memory balances (smallest currency unit) for tests/dev hosts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBalances {
    balances: HashMap<ActorId, u64>,
}

impl InMemoryBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, actor: ActorId) -> u64 {
        self.balances.get(&actor).copied().unwrap_or(0)
    }

    /// Credit an actor from outside the ledger (faucet / top-up).
    pub fn deposit(&mut self, actor: ActorId, amount: u64) -> Result<u64, FundsError> {
        let current = self.balance_of(actor);
        let next = current.checked_add(amount).ok_or(FundsError::Overflow)?;
        self.balances.insert(actor, next);
        Ok(next)
    }
}

impl Funds for InMemoryBalances {
    fn transfer(&mut self, from: ActorId, to: ActorId, amount: u64) -> Result<(), FundsError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(FundsError::Insufficient {
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(FundsError::Overflow)?;

        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        debug!(%from, %to, amount, "funds transferred");
        Ok(())
    }
}
