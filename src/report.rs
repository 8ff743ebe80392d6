// 📊 Daily Snapshots - one row per account per simulated day
//
// Rows are flat so they export to CSV as-is; the same rows serialize to JSON.

use crate::entities::Account;
use crate::token::AccountId;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub date: NaiveDate,
    pub account: AccountId,
    /// "individual" or "pooled"
    pub kind: String,
    pub age: Option<u32>,
    pub currency: usize,
    /// Investment wallet, or the holding wallet for a pool
    pub investment: usize,
    pub accumulated: usize,
    pub expired: usize,
    pub pending_income: usize,
    pub pending_outcome: usize,
    pub entitlement: usize,
}

impl AccountSnapshot {
    pub fn capture(account: &Account, date: NaiveDate) -> Self {
        match account {
            Account::Individual(ledger) => AccountSnapshot {
                date,
                account: ledger.id().clone(),
                kind: "individual".to_string(),
                age: ledger.age(date).ok(),
                currency: ledger.currency_wallet().len(),
                investment: ledger.investment_wallet().len(),
                accumulated: ledger.accumulated().len(),
                expired: ledger.expired_investment_pool().len(),
                pending_income: ledger.pending_income().len(),
                pending_outcome: ledger.pending_outcome().len(),
                entitlement: ledger.daily_entitlement(),
            },
            Account::Pooled(pool) => AccountSnapshot {
                date,
                account: pool.id().clone(),
                kind: "pooled".to_string(),
                age: None,
                currency: 0,
                investment: pool.holding_wallet().len(),
                accumulated: pool.accumulated().len(),
                expired: 0,
                pending_income: 0,
                pending_outcome: 0,
                entitlement: 0,
            },
        }
    }
}

/// Write snapshot rows to a CSV file (header row included)
pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[AccountSnapshot]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())
        .with_context(|| format!("Failed to create CSV file: {:?}", path.as_ref()))?;

    for row in rows {
        writer
            .serialize(row)
            .context("Failed to write snapshot row")?;
    }
    writer.flush().context("Failed to flush CSV file")?;

    Ok(())
}

/// Same rows as CSV text, for callers that don't want a file
pub fn to_csv_string(rows: &[AccountSnapshot]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).context("Failed to write snapshot row")?;
    }
    let bytes = writer.into_inner().context("Failed to finish CSV output")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountLedger, PoolPolicy, PooledAccount};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_capture_individual() {
        let mut ledger = AccountLedger::new(AccountId::from("alice"), Some(date(1990, 6, 1)));
        ledger.issue(date(2020, 1, 1));
        ledger.issue(date(2020, 1, 2));

        let row = AccountSnapshot::capture(&Account::Individual(ledger), date(2020, 1, 2));

        assert_eq!(row.kind, "individual");
        assert_eq!(row.age, Some(29));
        assert_eq!(row.currency, 2);
        assert_eq!(row.investment, 2);
        assert_eq!(row.entitlement, 1);
    }

    #[test]
    fn test_capture_pool() {
        let pool = PooledAccount::new(
            AccountId::from("coop"),
            vec![AccountId::from("founder")],
            PoolPolicy::default(),
        )
        .unwrap();

        let row = AccountSnapshot::capture(&Account::Pooled(pool), date(2020, 1, 2));

        assert_eq!(row.kind, "pooled");
        assert_eq!(row.age, None);
        assert_eq!(row.entitlement, 0);
    }

    #[test]
    fn test_csv_output() {
        let ledger = AccountLedger::new(AccountId::from("bob"), None);
        let rows = vec![AccountSnapshot::capture(&Account::Individual(ledger), date(2020, 1, 1))];

        let csv = to_csv_string(&rows).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "date,account,kind,age,currency,investment,accumulated,expired,pending_income,pending_outcome,entitlement"
        );
        assert_eq!(lines.next().unwrap(), "2020-01-01,bob,individual,,0,0,0,0,0,0,1");
    }
}
