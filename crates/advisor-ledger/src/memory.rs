//! In-memory ledger.

use advisor_core::error::LedgerError;
use advisor_core::traits::PortfolioLedger;
use advisor_core::types::{ExecutionResult, Portfolio};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::LedgerBook;

/// Ledger held in process memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    book: RwLock<LedgerBook>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a portfolio (builder style).
    pub fn with_portfolio(mut self, portfolio: Portfolio) -> Self {
        self.book.get_mut().upsert(portfolio);
        self
    }

    /// Number of recorded executions.
    pub async fn execution_count(&self) -> usize {
        self.book.read().await.executions.len()
    }
}

#[async_trait]
impl PortfolioLedger for MemoryLedger {
    async fn portfolio(&self, portfolio_id: &str) -> Result<Portfolio, LedgerError> {
        self.book.read().await.portfolio(portfolio_id)
    }

    async fn execution_for(&self, proposal_id: Uuid) -> Result<Option<ExecutionResult>, LedgerError> {
        Ok(self.book.read().await.executions.get(&proposal_id).cloned())
    }

    async fn commit(
        &self,
        expected_version: u64,
        portfolio: Portfolio,
        execution: ExecutionResult,
    ) -> Result<Portfolio, LedgerError> {
        self.book
            .write()
            .await
            .commit(expected_version, portfolio, execution)
    }

    async fn upsert(&self, portfolio: Portfolio) -> Result<Portfolio, LedgerError> {
        Ok(self.book.write().await.upsert(portfolio))
    }
}
