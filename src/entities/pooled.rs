// 🏢 Pooled Account - an organization's ledger
//
// Holds investment tokens contributed by participants. Payments made to a
// pooled account are never kept: they pass straight through its
// DistributionStrategy to beneficiaries and stakeholders.

use crate::distribution::{Allocation, DistributionStrategy};
use crate::error::{LedgerError, Result};
use crate::token::{AccountId, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::validate_amount;

/// Policy knobs for a pooled account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPolicy {
    /// Whether `distribute_to_self` may move holdings into the pool's own
    /// accumulated record
    #[serde(default)]
    pub allow_self_distribution: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledAccount {
    id: AccountId,
    holding_wallet: Vec<Token>,
    accumulated: Vec<Token>,
    distribution: DistributionStrategy,
    policy: PoolPolicy,
}

impl PooledAccount {
    pub fn new(id: AccountId, stakeholders: Vec<AccountId>, policy: PoolPolicy) -> Result<Self> {
        Ok(PooledAccount {
            id,
            holding_wallet: Vec::new(),
            accumulated: Vec::new(),
            distribution: DistributionStrategy::new(stakeholders)?,
            policy,
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn holding_wallet(&self) -> &[Token] {
        &self.holding_wallet
    }

    pub fn accumulated(&self) -> &[Token] {
        &self.accumulated
    }

    pub fn distribution(&self) -> &DistributionStrategy {
        &self.distribution
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    /// Validate a contribution without taking it: investment tokens only,
    /// each contributed at most once.
    pub fn check_contribution(&self, tokens: &[Token]) -> Result<()> {
        let not_investment: Vec<Token> = tokens
            .iter()
            .filter(|t| t.kind() != TokenKind::Investment)
            .cloned()
            .collect();
        if !not_investment.is_empty() {
            return Err(LedgerError::InvalidToken(not_investment));
        }

        let held: HashSet<&Token> = self.holding_wallet.iter().collect();
        let mut seen = HashSet::new();
        let duplicates: Vec<Token> = tokens
            .iter()
            .filter(|t| held.contains(*t) || !seen.insert(*t))
            .cloned()
            .collect();
        if !duplicates.is_empty() {
            return Err(LedgerError::DuplicateContribution(duplicates));
        }
        Ok(())
    }

    pub fn accept_investment(&mut self, tokens: Vec<Token>) -> Result<()> {
        self.check_contribution(&tokens)?;
        self.holding_wallet.extend(tokens);
        Ok(())
    }

    /// Remove the oldest `amount` holdings for delivery to another account
    pub(crate) fn withdraw(&mut self, amount: i64) -> Result<Vec<Token>> {
        let count = validate_amount(amount, self.holding_wallet.len())?;
        Ok(self.holding_wallet.drain(..count).collect())
    }

    /// Move holdings into the pool's own accumulated record; only when the
    /// policy allows it
    pub fn distribute_to_self(&mut self, amount: i64) -> Result<()> {
        if !self.policy.allow_self_distribution {
            return Err(LedgerError::InvalidTarget(self.id.clone()));
        }
        let tokens = self.withdraw(amount)?;
        self.accumulated.extend(tokens);
        Ok(())
    }

    /// Payments are not stored: every token is routed by the distribution
    pub fn receive(&mut self, tokens: Vec<Token>) -> Vec<Allocation> {
        self.distribution.allocate(tokens)
    }

    pub fn register_beneficiary(&mut self, account: &AccountId, times: usize) {
        self.distribution.register_beneficiary(account, times);
    }

    pub fn register_stakeholder(&mut self, account: &AccountId, times: usize) {
        self.distribution.register_stakeholder(account, times);
    }

    pub(crate) fn holdings(&self) -> impl Iterator<Item = &Token> {
        self.holding_wallet.iter().chain(self.accumulated.iter())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn investment(owner: &str, n: usize) -> Vec<Token> {
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        (0..n)
            .map(|i| Token::new(AccountId::from(owner), date, TokenKind::Investment, i as u32))
            .collect()
    }

    fn pool(policy: PoolPolicy) -> PooledAccount {
        PooledAccount::new(AccountId::from("coop"), vec![AccountId::from("founder")], policy).unwrap()
    }

    #[test]
    fn test_pool_requires_stakeholders() {
        let result = PooledAccount::new(AccountId::from("coop"), vec![], PoolPolicy::default());
        assert_eq!(result.unwrap_err(), LedgerError::EmptyStakeholderSet);
    }

    #[test]
    fn test_accept_investment() {
        let mut coop = pool(PoolPolicy::default());
        coop.accept_investment(investment("alice", 3)).unwrap();

        assert_eq!(coop.holding_wallet().len(), 3);
    }

    #[test]
    fn test_duplicate_contribution_rejected() {
        let mut coop = pool(PoolPolicy::default());
        let tokens = investment("alice", 2);
        coop.accept_investment(tokens.clone()).unwrap();

        let mut again = investment("bob", 1);
        again.push(tokens[1].clone());
        let err = coop.accept_investment(again).unwrap_err();

        assert_eq!(err, LedgerError::DuplicateContribution(vec![tokens[1].clone()]));
        assert_eq!(coop.holding_wallet().len(), 2);
    }

    #[test]
    fn test_duplicate_within_one_batch_rejected() {
        let mut coop = pool(PoolPolicy::default());
        let token = investment("alice", 1).remove(0);

        let err = coop.accept_investment(vec![token.clone(), token.clone()]).unwrap_err();
        assert_eq!(err, LedgerError::DuplicateContribution(vec![token]));
        assert!(coop.holding_wallet().is_empty());
    }

    #[test]
    fn test_currency_contribution_rejected() {
        let mut coop = pool(PoolPolicy::default());
        let date = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let currency = Token::new(AccountId::from("alice"), date, TokenKind::Currency, 0);

        assert!(matches!(
            coop.accept_investment(vec![currency]),
            Err(LedgerError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_receive_is_forwarded_not_stored() {
        let mut coop = pool(PoolPolicy::default());
        coop.register_beneficiary(&AccountId::from("bob"), 1);

        let allocations = coop.receive(investment("payer", 2));

        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].recipient.as_str(), "bob");
        assert_eq!(allocations[1].recipient.as_str(), "founder");
        assert!(coop.holding_wallet().is_empty());
        assert!(coop.accumulated().is_empty());
    }

    #[test]
    fn test_withdraw_validation() {
        let mut coop = pool(PoolPolicy::default());
        coop.accept_investment(investment("alice", 2)).unwrap();

        assert_eq!(coop.withdraw(-1).unwrap_err(), LedgerError::InvalidAmount(-1));
        assert!(matches!(
            coop.withdraw(3),
            Err(LedgerError::InsufficientFunds { requested: 3, available: 2 })
        ));

        let taken = coop.withdraw(1).unwrap();
        assert_eq!(taken[0].sequence(), 0);
        assert_eq!(coop.holding_wallet().len(), 1);
    }

    #[test]
    fn test_self_distribution_follows_policy() {
        let mut closed = pool(PoolPolicy::default());
        closed.accept_investment(investment("alice", 2)).unwrap();
        assert_eq!(
            closed.distribute_to_self(1).unwrap_err(),
            LedgerError::InvalidTarget(AccountId::from("coop"))
        );
        assert_eq!(closed.holding_wallet().len(), 2);

        let mut open = pool(PoolPolicy {
            allow_self_distribution: true,
        });
        open.accept_investment(investment("alice", 2)).unwrap();
        open.distribute_to_self(2).unwrap();
        assert!(open.holding_wallet().is_empty());
        assert_eq!(open.accumulated().len(), 2);
    }
}
