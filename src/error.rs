// ⚠️ Ledger Errors - every rejection the engine can produce
//
// All failures are local validation failures: operations are deterministic
// and in-memory, so nothing here is retryable. Preconditions are checked
// before any mutation, so an Err always means "state untouched".

use crate::token::{AccountId, Token};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Negative amount requested for spend/invest/distribute
    #[error("cannot transfer a negative amount ({0})")]
    InvalidAmount(i64),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: usize },

    /// Investment (or registration) directed at an account of the wrong kind
    #[error("account {0} is not a valid target for this operation")]
    InvalidTarget(AccountId),

    /// Tokens not present where the operation expected them
    #[error("{} token(s) invalid: {}", .0.len(), join_tokens(.0))]
    InvalidToken(Vec<Token>),

    #[error("token(s) already contributed: {}", join_tokens(.0))]
    DuplicateContribution(Vec<Token>),

    #[error("a distribution needs at least one stakeholder")]
    EmptyStakeholderSet,

    /// Restored distribution state whose round-robin cursor points past the
    /// stakeholder list
    #[error("stakeholder cursor {cursor} out of range for {len} stakeholder(s)")]
    StakeholderCursorOutOfRange { cursor: usize, len: usize },

    #[error("malformed token text: {0:?}")]
    MalformedToken(String),

    #[error("date {as_of} precedes birth date {birth_date}")]
    InvalidDate {
        as_of: NaiveDate,
        birth_date: NaiveDate,
    },

    /// A day was ticked that is not after the previous tick; issuing twice
    /// for one date would mint tokens with identical identities
    #[error("cannot advance to {date}: already at {current}")]
    StaleDate { date: NaiveDate, current: NaiveDate },

    #[error("account {0} has no birth date")]
    MissingBirthDate(AccountId),

    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("account {0} already exists")]
    DuplicateAccount(AccountId),

    #[error("account {id} is not {expected} account")]
    WrongAccountKind { id: AccountId, expected: &'static str },
}

fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LedgerError>;

// ============================================================================
// TESTS
// ============================================================================
