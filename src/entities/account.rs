// 💳 Account Ledger - one individual participant's tokens
//
// Token lifecycle for a single account:
//   issue → wallet → (spend | invest | outdate) → elsewhere
//   receive → pending_income → (reconcile) → accumulated
//   pay out → pending_outcome receipt → (reconcile) → cleared
//
// Wallets are kept in insertion order, which is chronological: index 0 is
// always the oldest token. `accumulated` and `expired_investment_pool` are
// terminal; nothing ever leaves them.

use crate::error::{LedgerError, Result};
use crate::token::{AccountId, Token, TokenKind};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::validate_amount;

/// Tokens this many days old (or older) leave the wallets on the next sweep
pub const EXPIRY_DAYS: i64 = 30;

// ============================================================================
// ACCOUNT LEDGER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedger {
    id: AccountId,
    birth_date: Option<NaiveDate>,

    currency_wallet: Vec<Token>,
    investment_wallet: Vec<Token>,

    /// Tokens retired by expiry, reconciliation surplus, or self-spend
    accumulated: Vec<Token>,

    /// Investment tokens that aged out ("trash")
    expired_investment_pool: Vec<Token>,

    /// Tokens received since the last reconciliation
    pending_income: Vec<Token>,

    /// Receipts of tokens paid to other accounts since the last
    /// reconciliation. Identities only: the tokens live with the payee.
    pending_outcome: Vec<Token>,

    /// Total tokens ever created by `issue`, both kinds
    issued_count: usize,
}

impl AccountLedger {
    pub fn new(id: AccountId, birth_date: Option<NaiveDate>) -> Self {
        AccountLedger {
            id,
            birth_date,
            currency_wallet: Vec::new(),
            investment_wallet: Vec::new(),
            accumulated: Vec::new(),
            expired_investment_pool: Vec::new(),
            pending_income: Vec::new(),
            pending_outcome: Vec::new(),
            issued_count: 0,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        self.birth_date
    }

    pub fn currency_wallet(&self) -> &[Token] {
        &self.currency_wallet
    }

    pub fn investment_wallet(&self) -> &[Token] {
        &self.investment_wallet
    }

    pub fn accumulated(&self) -> &[Token] {
        &self.accumulated
    }

    pub fn expired_investment_pool(&self) -> &[Token] {
        &self.expired_investment_pool
    }

    pub fn pending_income(&self) -> &[Token] {
        &self.pending_income
    }

    pub fn pending_outcome(&self) -> &[Token] {
        &self.pending_outcome
    }

    pub fn issued_count(&self) -> usize {
        self.issued_count
    }

    // ========================================================================
    // ISSUANCE
    // ========================================================================

    /// `floor(cbrt(len(accumulated))) + 1`
    pub fn daily_entitlement(&self) -> usize {
        integer_cbrt(self.accumulated.len()) + 1
    }

    /// Append today's entitlement of fresh tokens of both kinds.
    /// Returns how many of each kind were issued.
    pub fn issue(&mut self, date: NaiveDate) -> usize {
        let count = self.daily_entitlement();

        for sequence in 0..count as u32 {
            self.currency_wallet
                .push(Token::new(self.id.clone(), date, TokenKind::Currency, sequence));
            self.investment_wallet
                .push(Token::new(self.id.clone(), date, TokenKind::Investment, sequence));
        }
        self.issued_count += 2 * count;

        debug!("{}: issued {} token(s) of each kind for {}", self.id, count, date);
        count
    }

    // ========================================================================
    // INCOMING / OUTGOING
    // ========================================================================

    /// Accept tokens paid to this account. No provenance check: once received,
    /// a token is as good as any other.
    pub fn receive(&mut self, tokens: Vec<Token>) {
        self.pending_income.extend(tokens);
    }

    /// Oldest `amount` tokens of the given kind, without removing them
    pub fn oldest(&self, kind: TokenKind, amount: i64) -> Result<&[Token]> {
        let wallet = self.wallet(kind);
        let count = validate_amount(amount, wallet.len())?;
        Ok(&wallet[..count])
    }

    /// Remove and return the oldest `amount` tokens of the given kind
    pub(crate) fn withdraw(&mut self, kind: TokenKind, amount: i64) -> Result<Vec<Token>> {
        let wallet = self.wallet_mut(kind);
        let count = validate_amount(amount, wallet.len())?;
        Ok(wallet.drain(..count).collect())
    }

    /// Spend the oldest `amount` currency tokens towards another account.
    /// The caller hands the returned tokens to the payee.
    pub(crate) fn pay_out(&mut self, amount: i64) -> Result<Vec<Token>> {
        let tokens = self.withdraw(TokenKind::Currency, amount)?;
        self.pending_outcome.extend(tokens.iter().cloned());
        Ok(tokens)
    }

    /// Paying yourself turns spendable tokens straight into accumulated
    /// wealth, skipping the pending/reconciliation path.
    pub fn spend_to_self(&mut self, amount: i64) -> Result<()> {
        let tokens = self.withdraw(TokenKind::Currency, amount)?;
        self.accumulated.extend(tokens);
        Ok(())
    }

    // ========================================================================
    // EXPIRATION
    // ========================================================================

    /// Retire the given wallet tokens: currency goes to `accumulated`,
    /// investment to `expired_investment_pool`.
    ///
    /// All-or-nothing: if any token is not currently in a wallet (or is listed
    /// twice), nothing moves and the error lists every offender.
    pub fn outdate(&mut self, tokens: &[Token]) -> Result<()> {
        let invalid: Vec<Token> = {
            let held: HashSet<&Token> = self
                .currency_wallet
                .iter()
                .chain(self.investment_wallet.iter())
                .collect();
            let mut seen = HashSet::new();
            tokens
                .iter()
                .filter(|t| !held.contains(*t) || !seen.insert(*t))
                .cloned()
                .collect()
        };
        if !invalid.is_empty() {
            return Err(LedgerError::InvalidToken(invalid));
        }

        let retiring: HashSet<&Token> = tokens.iter().collect();
        self.currency_wallet.retain(|t| !retiring.contains(t));
        self.investment_wallet.retain(|t| !retiring.contains(t));

        for token in tokens {
            match token.kind() {
                TokenKind::Currency => self.accumulated.push(token.clone()),
                TokenKind::Investment => self.expired_investment_pool.push(token.clone()),
            }
        }
        Ok(())
    }

    /// Outdate every wallet token at least [`EXPIRY_DAYS`] old.
    /// Returns how many tokens were retired.
    pub fn sweep_expired(&mut self, today: NaiveDate) -> Result<usize> {
        let expired: Vec<Token> = self
            .currency_wallet
            .iter()
            .chain(self.investment_wallet.iter())
            .filter(|t| t.age_in_days(today) >= EXPIRY_DAYS)
            .cloned()
            .collect();

        if !expired.is_empty() {
            debug!("{}: {} token(s) expired on {}", self.id, expired.len(), today);
            self.outdate(&expired)?;
        }
        Ok(expired.len())
    }

    // ========================================================================
    // RECONCILIATION
    // ========================================================================

    /// Close the period since the last reconciliation.
    ///
    /// While more tokens came in than went out, the most recently received
    /// token is promoted to `accumulated`. The income left over matched
    /// outgoing payments; it settles into `accumulated` in receipt order.
    /// Both pending sequences are empty afterwards. Returns how many surplus
    /// tokens were promoted.
    pub fn reconcile(&mut self) -> usize {
        let mut promoted = 0;
        while self.pending_income.len() > self.pending_outcome.len() {
            match self.pending_income.pop() {
                Some(token) => {
                    self.accumulated.push(token);
                    promoted += 1;
                }
                None => break,
            }
        }

        let settled = self.pending_income.len();
        self.accumulated.append(&mut self.pending_income);
        self.pending_outcome.clear();

        if promoted + settled > 0 {
            debug!("{}: promoted {}, settled {}", self.id, promoted, settled);
        }
        promoted
    }

    // ========================================================================
    // AGE
    // ========================================================================

    /// Completed years between birth date and `as_of`
    pub fn age(&self, as_of: NaiveDate) -> Result<u32> {
        let birth_date = self
            .birth_date
            .ok_or_else(|| LedgerError::MissingBirthDate(self.id.clone()))?;

        if as_of < birth_date {
            return Err(LedgerError::InvalidDate { as_of, birth_date });
        }

        let mut years = as_of.year() - birth_date.year();
        if (as_of.month(), as_of.day()) < (birth_date.month(), birth_date.day()) {
            years -= 1;
        }
        Ok(years as u32)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn wallet(&self, kind: TokenKind) -> &Vec<Token> {
        match kind {
            TokenKind::Currency => &self.currency_wallet,
            TokenKind::Investment => &self.investment_wallet,
        }
    }

    fn wallet_mut(&mut self, kind: TokenKind) -> &mut Vec<Token> {
        match kind {
            TokenKind::Currency => &mut self.currency_wallet,
            TokenKind::Investment => &mut self.investment_wallet,
        }
    }

    /// Every token this account physically holds, in every container
    pub(crate) fn holdings(&self) -> impl Iterator<Item = &Token> {
        self.currency_wallet
            .iter()
            .chain(self.investment_wallet.iter())
            .chain(self.accumulated.iter())
            .chain(self.expired_investment_pool.iter())
            .chain(self.pending_income.iter())
    }
}

/// Largest `r` with `r³ <= n`
fn integer_cbrt(n: usize) -> usize {
    let mut root = (n as f64).cbrt().round() as usize;
    // float rounding can land one off on either side
    while root > 0 && root.pow(3) > n {
        root -= 1;
    }
    while (root + 1).pow(3) <= n {
        root += 1;
    }
    root
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ledger(id: &str) -> AccountLedger {
        AccountLedger::new(AccountId::from(id), None)
    }

    fn filler(n: usize) -> Vec<Token> {
        (0..n)
            .map(|i| Token::new(AccountId::from("x"), date(2000, 1, 1), TokenKind::Currency, i as u32))
            .collect()
    }

    #[test]
    fn test_new_account_is_empty() {
        let account = AccountLedger::new(AccountId::from("1234"), Some(date(2012, 3, 18)));

        assert_eq!(account.id().as_str(), "1234");
        assert_eq!(account.birth_date(), Some(date(2012, 3, 18)));
        assert!(account.currency_wallet().is_empty());
        assert!(account.investment_wallet().is_empty());
        assert!(account.accumulated().is_empty());
        assert!(account.pending_income().is_empty());
        assert!(account.pending_outcome().is_empty());
    }

    #[test]
    fn test_daily_entitlement_formula() {
        for (accumulated, expected) in [(0, 1), (1, 2), (7, 2), (8, 3), (26, 3), (27, 4), (64, 5), (1000, 11)] {
            let mut account = ledger("id");
            account.accumulated = filler(accumulated);
            assert_eq!(account.daily_entitlement(), expected, "accumulated = {}", accumulated);
        }
    }

    #[test]
    fn test_integer_cbrt_exact_cubes() {
        for r in 0..200usize {
            assert_eq!(integer_cbrt(r.pow(3)), r);
            if r > 0 {
                assert_eq!(integer_cbrt(r.pow(3) - 1), r - 1);
            }
        }
    }

    #[test]
    fn test_issue_with_empty_accumulated() {
        let mut account = ledger("id");
        account.issue(date(2000, 1, 1));

        assert_eq!(account.currency_wallet().len(), 1);
        assert_eq!(account.investment_wallet().len(), 1);
        assert_eq!(account.issued_count(), 2);
    }

    #[test]
    fn test_issue_sequences_and_text_form() {
        let mut account = ledger("id");
        account.accumulated = filler(8);

        assert_eq!(account.issue(date(2000, 1, 1)), 3);

        let currency: Vec<String> = account.currency_wallet().iter().map(|t| t.to_string()).collect();
        let investment: Vec<String> = account.investment_wallet().iter().map(|t| t.to_string()).collect();
        assert_eq!(
            currency,
            ["2000-01-01-id-guzi0000", "2000-01-01-id-guzi0001", "2000-01-01-id-guzi0002"]
        );
        assert_eq!(
            investment,
            ["2000-01-01-id-guza0000", "2000-01-01-id-guza0001", "2000-01-01-id-guza0002"]
        );
    }

    #[test]
    fn test_receive_goes_to_pending_income() {
        let mut account = ledger("id");
        account.receive(filler(3));

        assert_eq!(account.pending_income().len(), 3);
        assert!(account.currency_wallet().is_empty());
    }

    #[test]
    fn test_withdraw_rejects_negative_amount() {
        let mut account = ledger("id");
        account.issue(date(2010, 1, 1));

        let err = account.withdraw(TokenKind::Currency, -10).unwrap_err();
        assert_eq!(err, LedgerError::InvalidAmount(-10));
        assert_eq!(account.currency_wallet().len(), 1);
    }

    #[test]
    fn test_withdraw_rejects_unaffordable_amount() {
        let mut account = ledger("id");

        let err = account.pay_out(10).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 10,
                available: 0
            }
        );
        assert!(account.pending_outcome().is_empty());
    }

    #[test]
    fn test_pay_out_takes_oldest_first() {
        let mut account = ledger("src");
        for day in 1..=5 {
            account.issue(date(2010, 1, day));
        }
        let wallet = account.currency_wallet().to_vec();

        let paid = account.pay_out(2).unwrap();

        assert_eq!(paid, wallet[..2]);
        assert_eq!(account.currency_wallet(), &wallet[2..]);
        assert_eq!(account.pending_outcome(), &wallet[..2]);
    }

    #[test]
    fn test_oldest_does_not_mutate() {
        let mut account = ledger("src");
        account.issue(date(2010, 1, 1));
        account.issue(date(2010, 1, 2));

        let peeked = account.oldest(TokenKind::Investment, 1).unwrap().to_vec();
        assert_eq!(peeked[0].created_on(), date(2010, 1, 1));
        assert_eq!(account.investment_wallet().len(), 2);
    }

    #[test]
    fn test_spend_to_self_goes_to_accumulated() {
        let mut account = ledger("");
        for day in 1..=10 {
            account.issue(date(2010, 2, day));
        }

        account.spend_to_self(10).unwrap();

        assert!(account.currency_wallet().is_empty());
        assert!(account.pending_income().is_empty());
        assert!(account.pending_outcome().is_empty());
        assert_eq!(account.accumulated().len(), 10);
    }

    #[test]
    fn test_outdate_unknown_tokens_rejected() {
        let mut account = ledger("id");
        let strangers = filler(2);

        let err = account.outdate(&strangers).unwrap_err();
        assert_eq!(err, LedgerError::InvalidToken(strangers));
    }

    #[test]
    fn test_outdate_is_all_or_nothing() {
        let mut account = ledger("id");
        account.issue(date(2000, 1, 1));
        let mine = account.currency_wallet()[0].clone();
        let stranger = filler(1).remove(0);

        let err = account.outdate(&[mine.clone(), stranger.clone()]).unwrap_err();

        assert_eq!(err, LedgerError::InvalidToken(vec![stranger]));
        assert_eq!(account.currency_wallet(), &[mine]);
        assert!(account.accumulated().is_empty());
    }

    #[test]
    fn test_outdate_rejects_token_listed_twice() {
        let mut account = ledger("id");
        account.issue(date(2000, 1, 1));
        let mine = account.currency_wallet()[0].clone();

        let err = account.outdate(&[mine.clone(), mine.clone()]).unwrap_err();
        assert_eq!(err, LedgerError::InvalidToken(vec![mine]));
        assert_eq!(account.currency_wallet().len(), 1);
    }

    #[test]
    fn test_outdate_routes_by_kind() {
        let mut account = ledger("id");
        for day in 1..=3 {
            account.issue(date(2000, 1, day));
        }
        let currency = account.currency_wallet()[0].clone();
        let investment = account.investment_wallet()[1].clone();

        account.outdate(&[currency.clone(), investment.clone()]).unwrap();

        assert_eq!(account.currency_wallet().len(), 2);
        assert_eq!(account.investment_wallet().len(), 2);
        assert_eq!(account.accumulated(), &[currency]);
        assert_eq!(account.expired_investment_pool(), &[investment]);
    }

    #[test]
    fn test_sweep_boundary_is_thirty_days() {
        let mut account = ledger("id");
        account.issue(date(2010, 1, 1));
        account.issue(date(2010, 1, 2));

        // 2010-01-31 is 30 days after 01-01 and 29 after 01-02
        let retired = account.sweep_expired(date(2010, 1, 31)).unwrap();

        assert_eq!(retired, 2);
        assert_eq!(account.currency_wallet().len(), 1);
        assert_eq!(account.currency_wallet()[0].created_on(), date(2010, 1, 2));
        assert_eq!(account.accumulated().len(), 1);
        assert_eq!(account.expired_investment_pool().len(), 1);
    }

    #[test]
    fn test_sweep_after_a_month() {
        let mut account = ledger("id");
        account.issue(date(2010, 1, 1));

        account.sweep_expired(date(2010, 2, 1)).unwrap();

        assert!(account.currency_wallet().is_empty());
        assert_eq!(account.accumulated().len(), 1);
    }

    #[test]
    fn test_spending_oldest_first_avoids_expiry() {
        let mut account = ledger("source");
        for day in 1..=31 {
            account.issue(date(2010, 1, day));
        }

        account.pay_out(10).unwrap();
        for day in 1..=10 {
            account.issue(date(2010, 2, day));
        }
        account.sweep_expired(date(2010, 2, 9)).unwrap();

        assert!(account.accumulated().is_empty());
    }

    #[test]
    fn test_reconcile_with_negative_balance() {
        let mut account = ledger("id");
        account.pending_outcome.extend(filler(1));

        assert_eq!(account.reconcile(), 0);

        assert!(account.pending_outcome().is_empty());
        assert!(account.pending_income().is_empty());
        assert!(account.accumulated().is_empty());
    }

    #[test]
    fn test_reconcile_with_positive_balance() {
        let mut account = ledger("id");
        account.receive(filler(1));

        assert_eq!(account.reconcile(), 1);

        assert!(account.pending_income().is_empty());
        assert_eq!(account.accumulated().len(), 1);
    }

    #[test]
    fn test_reconcile_promotes_most_recent_first() {
        let mut account = ledger("id");
        let income = filler(3);
        account.receive(income.clone());
        account.pending_outcome.extend(filler(1));

        assert_eq!(account.reconcile(), 2);

        // surplus tail-first, then the matched remainder
        assert_eq!(
            account.accumulated(),
            &[income[2].clone(), income[1].clone(), income[0].clone()]
        );
        assert!(account.pending_income().is_empty());
        assert!(account.pending_outcome().is_empty());
    }

    #[test]
    fn test_reconcile_settles_balanced_exchange() {
        let mut account = ledger("id");
        for day in 1..=3 {
            account.issue(date(2010, 1, day));
        }
        account.pay_out(3).unwrap();
        let income = filler(3);
        account.receive(income.clone());

        assert_eq!(account.reconcile(), 0);

        assert_eq!(account.accumulated(), income.as_slice());
        assert!(account.pending_income().is_empty());
        assert!(account.pending_outcome().is_empty());

        // the next period starts from zero
        account.receive(filler(1));
        assert_eq!(account.reconcile(), 1);
        assert_eq!(account.accumulated().len(), 4);
    }

    #[test]
    fn test_age() {
        let account = AccountLedger::new(AccountId::from("id"), Some(date(2012, 1, 2)));

        assert_eq!(account.age(date(2016, 1, 1)).unwrap(), 3);
        assert_eq!(account.age(date(2016, 1, 2)).unwrap(), 4);
    }

    #[test]
    fn test_age_before_birth_rejected() {
        let account = AccountLedger::new(AccountId::from("id"), Some(date(2010, 1, 1)));

        assert!(matches!(
            account.age(date(2000, 1, 1)),
            Err(LedgerError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_age_without_birth_date() {
        let account = ledger("id");
        assert_eq!(
            account.age(date(2000, 1, 1)),
            Err(LedgerError::MissingBirthDate(AccountId::from("id")))
        );
    }
}
