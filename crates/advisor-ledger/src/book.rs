//! Ledger contents shared by the ledger implementations.

use advisor_core::error::LedgerError;
use advisor_core::types::{ExecutionResult, Portfolio};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Portfolios and the executions committed against them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerBook {
    pub portfolios: HashMap<String, Portfolio>,
    pub executions: HashMap<Uuid, ExecutionResult>,
}

impl LedgerBook {
    /// Get a portfolio by id.
    pub fn portfolio(&self, portfolio_id: &str) -> Result<Portfolio, LedgerError> {
        self.portfolios
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| LedgerError::PortfolioNotFound(portfolio_id.to_string()))
    }

    /// Compare-and-set a portfolio and record its execution.
    ///
    /// Nothing is modified unless every check passes.
    pub fn commit(
        &mut self,
        expected_version: u64,
        mut portfolio: Portfolio,
        execution: ExecutionResult,
    ) -> Result<Portfolio, LedgerError> {
        let current = self
            .portfolios
            .get(&portfolio.id)
            .ok_or_else(|| LedgerError::PortfolioNotFound(portfolio.id.clone()))?;

        if self.executions.contains_key(&execution.proposal_id) {
            return Err(LedgerError::AlreadyExecuted(execution.proposal_id));
        }

        if current.version != expected_version {
            return Err(LedgerError::VersionConflict {
                portfolio_id: portfolio.id.clone(),
                expected: expected_version,
                found: current.version,
            });
        }

        portfolio.version = expected_version + 1;
        self.executions.insert(execution.proposal_id, execution);
        self.portfolios.insert(portfolio.id.clone(), portfolio.clone());
        Ok(portfolio)
    }

    /// Insert or replace a portfolio, bumping its version past any stored one.
    pub fn upsert(&mut self, mut portfolio: Portfolio) -> Portfolio {
        if let Some(current) = self.portfolios.get(&portfolio.id) {
            portfolio.version = current.version + 1;
        }
        self.portfolios.insert(portfolio.id.clone(), portfolio.clone());
        portfolio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::types::{OrderKind, Side, TradeProposal};
    use rust_decimal_macros::dec;

    fn execution() -> ExecutionResult {
        let proposal = TradeProposal::new("X", Side::Buy, dec!(1), dec!(10), OrderKind::Limit).unwrap();
        ExecutionResult::filled(&proposal)
    }

    #[test]
    fn test_commit_bumps_version() {
        let mut book = LedgerBook::default();
        book.upsert(Portfolio::new("p1", "a", dec!(100)));

        let mut next = book.portfolio("p1").unwrap();
        next.cash_balance = dec!(90);
        let stored = book.commit(0, next, execution()).unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(book.portfolio("p1").unwrap().cash_balance, dec!(90));
        assert_eq!(book.executions.len(), 1);
    }

    #[test]
    fn test_version_conflict_changes_nothing() {
        let mut book = LedgerBook::default();
        book.upsert(Portfolio::new("p1", "a", dec!(100)));
        let before = book.portfolio("p1").unwrap();

        let mut next = before.clone();
        next.cash_balance = dec!(1);
        let err = book.commit(7, next, execution()).unwrap_err();

        assert!(matches!(err, LedgerError::VersionConflict { found: 0, .. }));
        assert_eq!(book.portfolio("p1").unwrap(), before);
        assert!(book.executions.is_empty());
    }

    #[test]
    fn test_duplicate_execution_rejected() {
        let mut book = LedgerBook::default();
        book.upsert(Portfolio::new("p1", "a", dec!(100)));
        let exec = execution();

        let p = book.portfolio("p1").unwrap();
        book.commit(0, p.clone(), exec.clone()).unwrap();
        let err = book.commit(1, p, exec.clone()).unwrap_err();

        assert!(matches!(err, LedgerError::AlreadyExecuted(id) if id == exec.proposal_id));
    }
}
