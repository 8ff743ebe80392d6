// Token Ledger - Core Library
// Closed-economy ledger: daily issuance, FIFO spending, 30-day expiry, and
// pooled accounts that fan payments out to beneficiaries and stakeholders.

pub mod error;
pub mod token;
pub mod entities;
pub mod distribution;
pub mod ledger;
pub mod audit;
pub mod config;
pub mod report;
pub mod simulation;
pub mod logger;

// Re-export commonly used types
pub use error::{LedgerError, Result};
pub use token::{AccountId, Token, TokenKind, encode, kind_of, created_on, parse};
pub use entities::{
    Account, AccountLedger, PooledAccount, PoolPolicy, EXPIRY_DAYS,
};
pub use distribution::{Allocation, DistributionStrategy};
pub use ledger::Ledger;
pub use audit::{AuditReport, AuditResult, ConservationAudit};
pub use config::{Action, ScenarioConfig, ScheduledAction};
pub use report::AccountSnapshot;
pub use simulation::{DaySummary, Simulation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
