// 📒 Ledger - owns every account and routes tokens between them
//
// Accounts never hold references to each other. A transfer is two steps:
// take tokens out of the source (validated, all-or-nothing), then deliver
// them. Delivering to a pooled account yields allocations, which are
// delivered in turn to the individual recipients.
//
// Every precondition (known accounts, right kinds, affordable amount) is
// checked before the source is touched.

use crate::entities::{Account, AccountLedger, PoolPolicy, PooledAccount};
use crate::error::{LedgerError, Result};
use crate::token::{AccountId, Token, TokenKind};
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Default, Clone)]
pub struct Ledger {
    accounts: BTreeMap<AccountId, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            accounts: BTreeMap::new(),
        }
    }

    // ========================================================================
    // OPENING ACCOUNTS
    // ========================================================================

    pub fn open_account(&mut self, id: AccountId, birth_date: Option<NaiveDate>) -> Result<()> {
        self.ensure_free(&id)?;
        info!("opened account {}", id);
        self.accounts
            .insert(id.clone(), Account::Individual(AccountLedger::new(id, birth_date)));
        Ok(())
    }

    /// Open a pooled account. Stakeholders must already be open individual
    /// accounts; the list may repeat ids but must not be empty.
    pub fn open_pool(
        &mut self,
        id: AccountId,
        stakeholders: Vec<AccountId>,
        policy: PoolPolicy,
    ) -> Result<()> {
        self.ensure_free(&id)?;
        for stakeholder in &stakeholders {
            self.ensure_recipient(stakeholder)?;
        }
        let pool = PooledAccount::new(id.clone(), stakeholders, policy)?;
        info!("opened pool {}", id);
        self.accounts.insert(id, Account::Pooled(pool));
        Ok(())
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn individual(&self, id: &AccountId) -> Result<&AccountLedger> {
        match self.accounts.get(id) {
            Some(Account::Individual(ledger)) => Ok(ledger),
            Some(Account::Pooled(_)) => Err(wrong_kind(id, "an individual")),
            None => Err(LedgerError::UnknownAccount(id.clone())),
        }
    }

    pub fn individual_mut(&mut self, id: &AccountId) -> Result<&mut AccountLedger> {
        match self.accounts.get_mut(id) {
            Some(Account::Individual(ledger)) => Ok(ledger),
            Some(Account::Pooled(_)) => Err(wrong_kind(id, "an individual")),
            None => Err(LedgerError::UnknownAccount(id.clone())),
        }
    }

    pub fn pool(&self, id: &AccountId) -> Result<&PooledAccount> {
        match self.accounts.get(id) {
            Some(Account::Pooled(pool)) => Ok(pool),
            Some(Account::Individual(_)) => Err(wrong_kind(id, "a pooled")),
            None => Err(LedgerError::UnknownAccount(id.clone())),
        }
    }

    fn pool_mut(&mut self, id: &AccountId) -> Result<&mut PooledAccount> {
        match self.accounts.get_mut(id) {
            Some(Account::Pooled(pool)) => Ok(pool),
            Some(Account::Individual(_)) => Err(wrong_kind(id, "a pooled")),
            None => Err(LedgerError::UnknownAccount(id.clone())),
        }
    }

    /// Ids of individual accounts, in id order
    pub fn individual_ids(&self) -> Vec<AccountId> {
        self.accounts
            .values()
            .filter(|a| !a.is_pooled())
            .map(|a| a.id().clone())
            .collect()
    }

    // ========================================================================
    // TRANSFERS
    // ========================================================================

    /// Pay `amount` tokens from one account to another.
    ///
    /// An individual pays its oldest currency; a pool pays its oldest
    /// holdings. Paying yourself moves the tokens to your own accumulated
    /// record instead of through pending income.
    pub fn spend(&mut self, from: &AccountId, to: &AccountId, amount: i64) -> Result<()> {
        if from == to {
            return self.account_mut(from)?.pay_self(amount);
        }

        if !self.accounts.contains_key(to) {
            return Err(LedgerError::UnknownAccount(to.clone()));
        }
        let tokens = self.account_mut(from)?.pay_out(amount)?;
        debug!("{} paid {} token(s) to {}", from, tokens.len(), to);
        self.deliver(to, tokens)
    }

    /// Distribute `amount` of a pool's holdings to `to`
    pub fn distribute(&mut self, pool: &AccountId, to: &AccountId, amount: i64) -> Result<()> {
        self.pool(pool)?;
        self.spend(pool, to, amount)
    }

    /// Contribute the investor's oldest `amount` investment tokens to a pool
    pub fn invest(&mut self, from: &AccountId, to: &AccountId, amount: i64) -> Result<()> {
        let offered = self.individual(from)?.oldest(TokenKind::Investment, amount)?;
        let pool = match self.accounts.get(to) {
            Some(Account::Pooled(pool)) => pool,
            Some(Account::Individual(_)) => return Err(LedgerError::InvalidTarget(to.clone())),
            None => return Err(LedgerError::UnknownAccount(to.clone())),
        };
        pool.check_contribution(offered)?;

        let tokens = self.individual_mut(from)?.withdraw(TokenKind::Investment, amount)?;
        debug!("{} invested {} token(s) in {}", from, tokens.len(), to);
        self.pool_mut(to)?.accept_investment(tokens)
    }

    /// Retire specific wallet tokens of an individual account
    pub fn outdate(&mut self, id: &AccountId, tokens: &[Token]) -> Result<()> {
        self.individual_mut(id)?.outdate(tokens)
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    pub fn register_beneficiary(
        &mut self,
        pool: &AccountId,
        account: &AccountId,
        times: usize,
    ) -> Result<()> {
        self.ensure_recipient(account)?;
        self.pool_mut(pool)?.register_beneficiary(account, times);
        Ok(())
    }

    pub fn register_stakeholder(
        &mut self,
        pool: &AccountId,
        account: &AccountId,
        times: usize,
    ) -> Result<()> {
        self.ensure_recipient(account)?;
        self.pool_mut(pool)?.register_stakeholder(account, times);
        Ok(())
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownAccount(id.clone()))
    }

    fn ensure_free(&self, id: &AccountId) -> Result<()> {
        if self.accounts.contains_key(id) {
            return Err(LedgerError::DuplicateAccount(id.clone()));
        }
        Ok(())
    }

    /// Distribution recipients must be individual accounts: a pool cannot
    /// keep payments, and pools paying pools could forward forever.
    fn ensure_recipient(&self, id: &AccountId) -> Result<()> {
        match self.accounts.get(id) {
            Some(Account::Individual(_)) => Ok(()),
            Some(Account::Pooled(_)) => Err(LedgerError::InvalidTarget(id.clone())),
            None => Err(LedgerError::UnknownAccount(id.clone())),
        }
    }

    fn deliver(&mut self, to: &AccountId, tokens: Vec<Token>) -> Result<()> {
        let mut pending = VecDeque::new();
        pending.push_back((to.clone(), tokens));

        while let Some((recipient, tokens)) = pending.pop_front() {
            // recipients are validated on registration and accounts are never
            // closed, so this lookup only fails on a broken invariant
            let account = self.account_mut(&recipient)?;
            for allocation in account.receive(tokens) {
                pending.push_back((allocation.recipient, vec![allocation.token]));
            }
        }
        Ok(())
    }
}

fn wrong_kind(id: &AccountId, expected: &'static str) -> LedgerError {
    LedgerError::WrongAccountKind {
        id: id.clone(),
        expected,
    }
}

// ============================================================================
// TESTS
// ============================================================================
