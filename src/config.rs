// 🧾 Scenario Configuration - simulations as data
//
// A scenario is a JSON file: the accounts and pools to open, who is
// registered with which pool, and a schedule of actions keyed by day offset.
//
// {
//   "start_date": "2024-01-01",
//   "days": 60,
//   "accounts": [{ "id": "alice", "birth_date": "1990-04-02" }, {}],
//   "pools": [{
//     "id": "coop",
//     "stakeholders": [{ "id": "alice" }],
//     "beneficiaries": [{ "id": "bob", "times": 3 }],
//     "allow_self_distribution": false
//   }],
//   "actions": [{ "day": 3, "action": "spend", "from": "alice", "to": "coop", "amount": 2 }]
// }
//
// An account entry without an id gets a generated one; such accounts only
// take part in the daily issuance.

use crate::entities::PoolPolicy;
use crate::error::Result as LedgerResult;
use crate::ledger::Ledger;
use crate::token::AccountId;
use anyhow::{bail, ensure, Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn default_times() -> usize {
    1
}

// ============================================================================
// SCENARIO PIECES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub id: Option<AccountId>,

    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// An id registered `times` times (a beneficiary or stakeholder entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: AccountId,

    #[serde(default = "default_times")]
    pub times: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub id: AccountId,

    pub stakeholders: Vec<Seat>,

    #[serde(default)]
    pub beneficiaries: Vec<Seat>,

    #[serde(flatten)]
    pub policy: PoolPolicy,
}

/// Something a participant does between two ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Spend {
        from: AccountId,
        to: AccountId,
        amount: i64,
    },
    Invest {
        from: AccountId,
        to: AccountId,
        amount: i64,
    },
    Distribute {
        pool: AccountId,
        to: AccountId,
        amount: i64,
    },
    RegisterBeneficiary {
        pool: AccountId,
        account: AccountId,
        #[serde(default = "default_times")]
        times: usize,
    },
    RegisterStakeholder {
        pool: AccountId,
        account: AccountId,
        #[serde(default = "default_times")]
        times: usize,
    },
}

impl Action {
    pub fn apply(&self, ledger: &mut Ledger) -> LedgerResult<()> {
        match self {
            Action::Spend { from, to, amount } => ledger.spend(from, to, *amount),
            Action::Invest { from, to, amount } => ledger.invest(from, to, *amount),
            Action::Distribute { pool, to, amount } => ledger.distribute(pool, to, *amount),
            Action::RegisterBeneficiary {
                pool,
                account,
                times,
            } => ledger.register_beneficiary(pool, account, *times),
            Action::RegisterStakeholder {
                pool,
                account,
                times,
            } => ledger.register_stakeholder(pool, account, *times),
        }
    }

    /// Every account id this action refers to
    fn ids(&self) -> [&AccountId; 2] {
        match self {
            Action::Spend { from, to, .. } | Action::Invest { from, to, .. } => [from, to],
            Action::Distribute { pool, to, .. } => [pool, to],
            Action::RegisterBeneficiary { pool, account, .. }
            | Action::RegisterStakeholder { pool, account, .. } => [pool, account],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAction {
    /// Day offset from `start_date`, 0-based
    pub day: u32,

    #[serde(flatten)]
    pub action: Action,
}

// ============================================================================
// SCENARIO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub start_date: NaiveDate,

    pub days: u32,

    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    #[serde(default)]
    pub pools: Vec<PoolConfig>,

    #[serde(default)]
    pub actions: Vec<ScheduledAction>,
}

impl ScenarioConfig {
    /// Load and validate a scenario file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read scenario file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: ScenarioConfig =
            serde_json::from_str(content).context("Failed to parse scenario JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.days > 0, "scenario must run for at least one day");

        let mut known = HashSet::new();
        let mut individuals = HashSet::new();
        for account in &self.accounts {
            if let Some(id) = &account.id {
                ensure!(known.insert(id), "account {} is declared twice", id);
                individuals.insert(id);
            }
        }
        for pool in &self.pools {
            ensure!(known.insert(&pool.id), "account {} is declared twice", pool.id);
        }

        for pool in &self.pools {
            ensure!(
                pool.stakeholders.iter().any(|s| s.times > 0),
                "pool {} needs at least one stakeholder",
                pool.id
            );
            for seat in pool.stakeholders.iter().chain(pool.beneficiaries.iter()) {
                if !individuals.contains(&seat.id) {
                    bail!(
                        "pool {} lists {}, which is not a declared individual account",
                        pool.id,
                        seat.id
                    );
                }
            }
        }

        for scheduled in &self.actions {
            ensure!(
                scheduled.day < self.days,
                "action on day {} is past the last day ({})",
                scheduled.day,
                self.days - 1
            );
            for id in scheduled.action.ids() {
                ensure!(known.contains(id), "action on day {} refers to unknown account {}", scheduled.day, id);
            }
        }

        Ok(())
    }

    /// Calendar date of a day offset
    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start_date + Duration::days(i64::from(day))
    }

    /// Actions scheduled for a day offset, in file order
    pub fn actions_on(&self, day: u32) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(move |s| s.day == day)
            .map(|s| &s.action)
    }

    /// Open every declared account and pool, with initial registrations
    pub fn build_ledger(&self) -> LedgerResult<Ledger> {
        let mut ledger = Ledger::new();

        for account in &self.accounts {
            let id = account.id.clone().unwrap_or_else(AccountId::generate);
            ledger.open_account(id, account.birth_date)?;
        }

        for pool in &self.pools {
            let stakeholders = expand(&pool.stakeholders);
            ledger.open_pool(pool.id.clone(), stakeholders, pool.policy)?;
            for seat in &pool.beneficiaries {
                ledger.register_beneficiary(&pool.id, &seat.id, seat.times)?;
            }
        }

        Ok(ledger)
    }
}

fn expand(seats: &[Seat]) -> Vec<AccountId> {
    seats
        .iter()
        .flat_map(|seat| std::iter::repeat(seat.id.clone()).take(seat.times))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
