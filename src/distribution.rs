// 🔀 Distribution Strategy - who receives a payment made to a pooled account
//
// Two tiers, evaluated token by token:
//   1. Beneficiary queue (FIFO, one entry = one token of entitlement, one-shot)
//   2. Stakeholders (round-robin forever once the queue is empty)
//
// The strategy never owns accounts. It records ids and returns allocations;
// the Ledger that owns the accounts performs delivery.

use crate::error::{LedgerError, Result};
use crate::token::{AccountId, Token};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

// ============================================================================
// ALLOCATION
// ============================================================================

/// One routing decision: `token` goes to `recipient`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub recipient: AccountId,
    pub token: Token,
}

// ============================================================================
// DISTRIBUTION STRATEGY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DistributionState")]
pub struct DistributionStrategy {
    beneficiary_queue: VecDeque<AccountId>,

    /// Never shrinks; `stakeholder_cursor` always indexes into it
    stakeholders: Vec<AccountId>,
    stakeholder_cursor: usize,

    /// Non-owning lookup: every id that was ever registered
    registry: BTreeSet<AccountId>,
}

impl DistributionStrategy {
    /// Fails with [`LedgerError::EmptyStakeholderSet`]: a pooled account may
    /// not keep payments, so someone must always be entitled to them.
    pub fn new(stakeholders: Vec<AccountId>) -> Result<Self> {
        if stakeholders.is_empty() {
            return Err(LedgerError::EmptyStakeholderSet);
        }

        let registry = stakeholders.iter().cloned().collect();
        Ok(DistributionStrategy {
            beneficiary_queue: VecDeque::new(),
            stakeholders,
            stakeholder_cursor: 0,
            registry,
        })
    }

    pub fn beneficiary_queue(&self) -> &VecDeque<AccountId> {
        &self.beneficiary_queue
    }

    pub fn stakeholders(&self) -> &[AccountId] {
        &self.stakeholders
    }

    pub fn stakeholder_cursor(&self) -> usize {
        self.stakeholder_cursor
    }

    pub fn is_registered(&self, id: &AccountId) -> bool {
        self.registry.contains(id)
    }

    /// Queue `times` one-token entitlements for `account`, behind everyone
    /// already waiting
    pub fn register_beneficiary(&mut self, account: &AccountId, times: usize) {
        self.registry.insert(account.clone());
        self.beneficiary_queue
            .extend(std::iter::repeat(account.clone()).take(times));
        info!("beneficiary {} registered x{}", account, times);
    }

    /// Add `times` permanent seats for `account` to the round-robin
    pub fn register_stakeholder(&mut self, account: &AccountId, times: usize) {
        self.registry.insert(account.clone());
        self.stakeholders
            .extend(std::iter::repeat(account.clone()).take(times));
        info!("stakeholder {} registered x{}", account, times);
    }

    /// Decide a recipient for every token, in order
    pub fn allocate(&mut self, tokens: Vec<Token>) -> Vec<Allocation> {
        tokens
            .into_iter()
            .map(|token| {
                let recipient = self.next_recipient();
                debug!("{} -> {}", token, recipient);
                Allocation { recipient, token }
            })
            .collect()
    }

    fn next_recipient(&mut self) -> AccountId {
        if let Some(beneficiary) = self.beneficiary_queue.pop_front() {
            return beneficiary;
        }

        let stakeholder = self.stakeholders[self.stakeholder_cursor].clone();
        self.stakeholder_cursor = (self.stakeholder_cursor + 1) % self.stakeholders.len();
        stakeholder
    }
}

/// Serialized form of a [`DistributionStrategy`], checked on the way in
#[derive(Deserialize)]
struct DistributionState {
    #[serde(default)]
    beneficiary_queue: VecDeque<AccountId>,
    stakeholders: Vec<AccountId>,
    #[serde(default)]
    stakeholder_cursor: usize,
    #[serde(default)]
    registry: BTreeSet<AccountId>,
}

impl TryFrom<DistributionState> for DistributionStrategy {
    type Error = LedgerError;

    fn try_from(state: DistributionState) -> Result<Self> {
        let mut strategy = DistributionStrategy::new(state.stakeholders)?;
        if state.stakeholder_cursor >= strategy.stakeholders.len() {
            return Err(LedgerError::StakeholderCursorOutOfRange {
                cursor: state.stakeholder_cursor,
                len: strategy.stakeholders.len(),
            });
        }

        strategy.stakeholder_cursor = state.stakeholder_cursor;
        strategy.registry.extend(state.registry);
        strategy
            .registry
            .extend(state.beneficiary_queue.iter().cloned());
        strategy.beneficiary_queue = state.beneficiary_queue;
        Ok(strategy)
    }
}

// ============================================================================
// TESTS
// ============================================================================
