// 📅 Daily Driver - advances simulated time one day at a time
//
// For every individual account, each day runs the fixed sequence
//
//   reconcile() → sweep_expired(date) → issue(date)
//
// Reordering these steps changes outcomes (e.g. sweeping before reconciling
// would let surplus income skip the accumulated pool). Accounts are ticked in
// id order; they don't affect each other within a tick.

use crate::audit::{AuditReport, ConservationAudit};
use crate::config::{Action, ScenarioConfig};
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::report::AccountSnapshot;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// What one tick did, summed over all accounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: Option<NaiveDate>,
    pub promoted: usize,
    pub expired: usize,
    /// Tokens issued, per kind
    pub issued: usize,
    pub actions_applied: usize,
    pub actions_rejected: usize,
}

pub struct Simulation {
    ledger: Ledger,
    current: Option<NaiveDate>,
    days: Vec<DaySummary>,
    snapshots: Vec<AccountSnapshot>,
}

impl Simulation {
    pub fn new(ledger: Ledger) -> Self {
        Simulation {
            ledger,
            current: None,
            days: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Replay a whole scenario: each day, tick, apply that day's actions,
    /// then snapshot every account. Rejected actions are logged and skipped.
    pub fn run(config: &ScenarioConfig) -> Result<Self> {
        let mut simulation = Simulation::new(config.build_ledger()?);

        for day in 0..config.days {
            let date = config.date_of(day);
            simulation.advance(date)?;

            for action in config.actions_on(day) {
                simulation.apply(action);
            }
            simulation.capture(date);
        }

        Ok(simulation)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current
    }

    pub fn days(&self) -> &[DaySummary] {
        &self.days
    }

    pub fn snapshots(&self) -> &[AccountSnapshot] {
        &self.snapshots
    }

    /// Tick every individual account for `date`, which must be later than
    /// the previous tick
    pub fn advance(&mut self, date: NaiveDate) -> Result<DaySummary> {
        if let Some(current) = self.current {
            if date <= current {
                return Err(LedgerError::StaleDate { date, current });
            }
        }

        let mut summary = DaySummary {
            date: Some(date),
            ..DaySummary::default()
        };

        for id in self.ledger.individual_ids() {
            let account = self.ledger.individual_mut(&id)?;
            summary.promoted += account.reconcile();
            summary.expired += account.sweep_expired(date)?;
            summary.issued += account.issue(date);
        }

        info!(
            "{}: issued {}, expired {}, promoted {}",
            date, summary.issued, summary.expired, summary.promoted
        );

        self.current = Some(date);
        self.days.push(summary.clone());
        Ok(summary)
    }

    /// Apply one action to the ledger. Returns whether it was accepted;
    /// a rejected action leaves every account untouched.
    pub fn apply(&mut self, action: &Action) -> bool {
        let outcome = action.apply(&mut self.ledger);
        let accepted = outcome.is_ok();

        if let Err(err) = outcome {
            warn!("rejected {:?}: {}", action, err);
        }
        if let Some(today) = self.days.last_mut() {
            if accepted {
                today.actions_applied += 1;
            } else {
                today.actions_rejected += 1;
            }
        }
        accepted
    }

    /// Record a snapshot row for every account
    pub fn capture(&mut self, date: NaiveDate) {
        self.snapshots
            .extend(self.ledger.accounts().map(|a| AccountSnapshot::capture(a, date)));
    }

    pub fn audit(&self) -> AuditReport {
        ConservationAudit::audit(&self.ledger, self.current)
    }
}

// ============================================================================
// TESTS
// ============================================================================
