// Account Entities
//
// Two kinds of account share one capability set: receive tokens, and pay
// tokens out (an individual spends currency, a pool distributes holdings).
// `Account` dispatches on the variant.

pub mod account;
pub mod pooled;

pub use account::{AccountLedger, EXPIRY_DAYS};
pub use pooled::{PoolPolicy, PooledAccount};

use crate::distribution::Allocation;
use crate::error::{LedgerError, Result};
use crate::token::{AccountId, Token};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Account {
    Individual(AccountLedger),
    Pooled(PooledAccount),
}

impl Account {
    pub fn id(&self) -> &AccountId {
        match self {
            Account::Individual(ledger) => ledger.id(),
            Account::Pooled(pool) => pool.id(),
        }
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Account::Pooled(_))
    }

    /// Take delivery of tokens. An individual keeps them as pending income;
    /// a pool hands back where each token has to go next.
    pub fn receive(&mut self, tokens: Vec<Token>) -> Vec<Allocation> {
        match self {
            Account::Individual(ledger) => {
                ledger.receive(tokens);
                Vec::new()
            }
            Account::Pooled(pool) => pool.receive(tokens),
        }
    }

    /// Remove the oldest `amount` payable tokens for delivery elsewhere
    pub(crate) fn pay_out(&mut self, amount: i64) -> Result<Vec<Token>> {
        match self {
            Account::Individual(ledger) => ledger.pay_out(amount),
            Account::Pooled(pool) => pool.withdraw(amount),
        }
    }

    /// Pay the account itself: straight to its accumulated record
    pub fn pay_self(&mut self, amount: i64) -> Result<()> {
        match self {
            Account::Individual(ledger) => ledger.spend_to_self(amount),
            Account::Pooled(pool) => pool.distribute_to_self(amount),
        }
    }

    pub(crate) fn holdings(&self) -> Box<dyn Iterator<Item = &Token> + '_> {
        match self {
            Account::Individual(ledger) => Box::new(ledger.holdings()),
            Account::Pooled(pool) => Box::new(pool.holdings()),
        }
    }
}

/// Shared amount check for every outgoing transfer: returns the amount as a
/// count once it is known to be non-negative and affordable.
pub(crate) fn validate_amount(amount: i64, available: usize) -> Result<usize> {
    if amount < 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let count = amount as usize;
    if count > available {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }
    Ok(count)
}
