// ⚖️ Conservation Audit - every issued token is somewhere, exactly once
//
// Formula, per owner:
//   issued = tokens located across all containers of all accounts
//
// Containers are wallets, accumulated pools, the expired pool, pending income,
// and a pool's holding wallet. `pending_outcome` is a receipt log, not a
// container, so it is not counted.

use crate::entities::Account;
use crate::ledger::Ledger;
use crate::token::{AccountId, Token};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// AUDIT RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditResult {
    /// Every token the owner issued was found exactly once
    Balanced { issued: usize },

    Discrepancy {
        issued: usize,
        located: usize,
        /// Tokens found in more than one place
        duplicated: Vec<Token>,
    },
}

impl AuditResult {
    pub fn is_balanced(&self) -> bool {
        matches!(self, AuditResult::Balanced { .. })
    }

    /// Issued minus located (negative when extra tokens turned up)
    pub fn missing(&self) -> i64 {
        match self {
            AuditResult::Balanced { .. } => 0,
            AuditResult::Discrepancy {
                issued, located, ..
            } => *issued as i64 - *located as i64,
        }
    }
}

// ============================================================================
// AUDIT REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub as_of: Option<NaiveDate>,
    pub results: BTreeMap<AccountId, AuditResult>,
    pub total_issued: usize,
    pub total_located: usize,
}

impl AuditReport {
    pub fn is_balanced(&self) -> bool {
        self.results.values().all(AuditResult::is_balanced)
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = (&AccountId, &AuditResult)> {
        self.results.iter().filter(|(_, r)| !r.is_balanced())
    }

    pub fn summary(&self) -> String {
        let as_of = self
            .as_of
            .map(|d| d.to_string())
            .unwrap_or_else(|| "start".to_string());
        format!(
            "Conservation audit ({}): {} owners, {} issued, {} located, {} discrepancy(ies)",
            as_of,
            self.results.len(),
            self.total_issued,
            self.total_located,
            self.discrepancies().count()
        )
    }
}

// ============================================================================
// AUDIT
// ============================================================================

pub struct ConservationAudit;

impl ConservationAudit {
    pub fn audit(ledger: &Ledger, as_of: Option<NaiveDate>) -> AuditReport {
        let mut issued: BTreeMap<AccountId, usize> = ledger
            .accounts()
            .filter_map(|account| match account {
                Account::Individual(l) => Some((l.id().clone(), l.issued_count())),
                Account::Pooled(_) => None,
            })
            .collect();

        let mut located: BTreeMap<AccountId, usize> = BTreeMap::new();
        let mut duplicated: BTreeMap<AccountId, Vec<Token>> = BTreeMap::new();
        let mut seen: HashSet<&Token> = HashSet::new();

        for token in ledger.accounts().flat_map(|a| a.holdings()) {
            *located.entry(token.owner().clone()).or_insert(0) += 1;
            if !seen.insert(token) {
                duplicated
                    .entry(token.owner().clone())
                    .or_default()
                    .push(token.clone());
            }
        }

        // foreign tokens (owners this ledger never issued for) are reported too
        for owner in located.keys() {
            issued.entry(owner.clone()).or_insert(0);
        }

        let results = issued
            .iter()
            .map(|(owner, &count)| {
                let found = located.get(owner).copied().unwrap_or(0);
                let dupes = duplicated.remove(owner).unwrap_or_default();
                let result = if found == count && dupes.is_empty() {
                    AuditResult::Balanced { issued: count }
                } else {
                    AuditResult::Discrepancy {
                        issued: count,
                        located: found,
                        duplicated: dupes,
                    }
                };
                (owner.clone(), result)
            })
            .collect();

        AuditReport {
            as_of,
            results,
            total_issued: issued.values().sum(),
            total_located: located.values().sum(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
