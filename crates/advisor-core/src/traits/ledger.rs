//! Portfolio ledger trait.

use crate::error::LedgerError;
use crate::types::{ExecutionResult, Portfolio};
use async_trait::async_trait;
use uuid::Uuid;

/// System of record for real portfolios and their executions.
///
/// Only the executor writes here. `commit` is an optimistic compare-and-set on
/// the portfolio version: the new portfolio and the execution record are
/// stored together or not at all.
#[async_trait]
pub trait PortfolioLedger: Send + Sync {
    /// Get the live state of a portfolio.
    async fn portfolio(&self, portfolio_id: &str) -> Result<Portfolio, LedgerError>;

    /// Look up the execution recorded for a proposal, if any.
    async fn execution_for(&self, proposal_id: Uuid) -> Result<Option<ExecutionResult>, LedgerError>;

    /// Atomically replace a portfolio and record an execution.
    ///
    /// # Arguments
    /// * `expected_version` - Version the caller read; the commit fails with
    ///   `VersionConflict` if the stored portfolio moved on
    /// * `portfolio` - New portfolio state; its version is assigned by the ledger
    /// * `execution` - Execution record keyed by its proposal id
    ///
    /// # Returns
    /// The stored portfolio with its new version
    async fn commit(
        &self,
        expected_version: u64,
        portfolio: Portfolio,
        execution: ExecutionResult,
    ) -> Result<Portfolio, LedgerError>;

    /// Create or replace a portfolio outside the trade path (account funding,
    /// initial import).
    async fn upsert(&self, portfolio: Portfolio) -> Result<Portfolio, LedgerError>;
}
