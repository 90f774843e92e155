//! Trade executor.

use advisor_core::error::{ExecutionError, LedgerError};
use advisor_core::traits::{mark_to_market, MarketData, PortfolioLedger};
use advisor_core::types::{ExecutionResult, ProposalStatus, TradeProposal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Commit attempts before giving up with `StaleState`
    pub max_commit_retries: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 3,
        }
    }
}

/// Commits approved proposals to the ledger.
///
/// Each attempt re-reads the live portfolio, re-validates the trade against
/// it and commits with the version it read. A proposal is executed at most
/// once: a proposal id already present in the ledger returns the recorded
/// execution instead of trading again. With market data attached, the live
/// portfolio is marked to market before the trade so the committed state
/// carries fresh prices.
pub struct Executor {
    ledger: Arc<dyn PortfolioLedger>,
    market: Option<Arc<dyn MarketData>>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(ledger: Arc<dyn PortfolioLedger>) -> Self {
        Self {
            ledger,
            market: None,
            config: ExecutorConfig::default(),
        }
    }

    /// Mark positions to this market before each commit.
    pub fn with_market(mut self, market: Arc<dyn MarketData>) -> Self {
        self.market = Some(market);
        self
    }

    /// Set the executor config.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// The ledger this executor writes to.
    pub fn ledger(&self) -> &Arc<dyn PortfolioLedger> {
        &self.ledger
    }

    /// Execute an approved proposal against a live portfolio.
    ///
    /// # Arguments
    /// * `portfolio_id` - Portfolio to trade in
    /// * `proposal` - Proposal with status `Approved`
    /// * `sector` - Sector for a newly opened position, when known
    pub async fn execute(
        &self,
        portfolio_id: &str,
        proposal: &TradeProposal,
        sector: Option<String>,
    ) -> Result<ExecutionResult, ExecutionError> {
        if proposal.status != ProposalStatus::Approved {
            return Err(ExecutionError::NotApproved(proposal.id));
        }

        let attempts = self.config.max_commit_retries.max(1);

        for attempt in 1..=attempts {
            if let Some(existing) = self.ledger.execution_for(proposal.id).await? {
                info!(proposal_id = %proposal.id, order_id = %existing.order_id, "Proposal already executed");
                return Ok(existing);
            }

            let live = self.ledger.portfolio(portfolio_id).await?;
            let mut next = live.clone();
            if let Some(market) = &self.market {
                let stale = mark_to_market(&mut next, market.as_ref()).await;
                if !stale.is_empty() {
                    debug!(portfolio_id, tickers = ?stale, "Keeping stored marks");
                }
            }
            next.apply_trade(
                proposal.side,
                &proposal.ticker,
                proposal.quantity,
                proposal.price,
                sector.clone(),
            )?;

            let execution = ExecutionResult::filled(proposal);

            match self.ledger.commit(live.version, next, execution.clone()).await {
                Ok(stored) => {
                    info!(
                        proposal_id = %proposal.id,
                        portfolio_id,
                        ticker = %proposal.ticker,
                        side = %proposal.side,
                        quantity = %proposal.quantity,
                        price = %proposal.price,
                        version = stored.version,
                        "Trade executed"
                    );
                    return Ok(execution);
                }
                Err(LedgerError::VersionConflict { expected, found, .. }) => {
                    warn!(
                        portfolio_id,
                        attempt,
                        expected,
                        found,
                        "Portfolio changed during execution, retrying"
                    );
                }
                Err(LedgerError::AlreadyExecuted(_)) => {
                    // Lost the race to a concurrent execution of the same proposal.
                    if let Some(existing) = self.ledger.execution_for(proposal.id).await? {
                        return Ok(existing);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ExecutionError::StaleState {
            portfolio_id: portfolio_id.to_string(),
            reason: format!("portfolio kept changing across {attempts} commit attempts"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLedger;
    use advisor_core::error::{DataError, TradeError};
    use advisor_core::types::{OrderKind, Portfolio, Position, Side, TradeProposal};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    fn approved(side: Side, quantity: rust_decimal::Decimal) -> TradeProposal {
        TradeProposal::new("AAA", side, quantity, dec!(100), OrderKind::Limit)
            .unwrap()
            .with_status(ProposalStatus::Approved)
    }

    fn ledger(cash: rust_decimal::Decimal) -> Arc<MemoryLedger> {
        Arc::new(MemoryLedger::new().with_portfolio(
            Portfolio::new("p1", "alice", cash).with_position(Position::new("AAA", dec!(10), dec!(80))),
        ))
    }

    #[tokio::test]
    async fn test_execute_buy() {
        let ledger = ledger(dec!(10000));
        let executor = Executor::new(ledger.clone());

        let result = executor
            .execute("p1", &approved(Side::Buy, dec!(10)), None)
            .await
            .unwrap();

        assert_eq!(result.total, dec!(1000));
        let portfolio = ledger.portfolio("p1").await.unwrap();
        assert_eq!(portfolio.cash_balance, dec!(9000));
        assert_eq!(portfolio.held_quantity("AAA"), dec!(20));
        assert_eq!(portfolio.version, 1);
    }

    #[tokio::test]
    async fn test_execute_is_idempotent() {
        let ledger = ledger(dec!(10000));
        let executor = Executor::new(ledger.clone());
        let proposal = approved(Side::Buy, dec!(10));

        let first = executor.execute("p1", &proposal, None).await.unwrap();
        let second = executor.execute("p1", &proposal, None).await.unwrap();

        assert_eq!(first.order_id, second.order_id);
        assert_eq!(ledger.execution_count().await, 1);
        assert_eq!(ledger.portfolio("p1").await.unwrap().cash_balance, dec!(9000));
    }

    #[tokio::test]
    async fn test_rejects_unapproved_proposal() {
        let executor = Executor::new(ledger(dec!(10000)));
        let pending =
            TradeProposal::new("AAA", Side::Buy, dec!(1), dec!(1), OrderKind::Limit).unwrap();

        let err = executor.execute("p1", &pending, None).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NotApproved(id) if id == pending.id));
    }

    #[tokio::test]
    async fn test_drifted_portfolio_fails_cleanly() {
        let ledger = ledger(dec!(10000));
        let executor = Executor::new(ledger.clone());

        // Cash spent elsewhere after the proposal was simulated.
        let mut drained = ledger.portfolio("p1").await.unwrap();
        drained.cash_balance = dec!(500);
        ledger.upsert(drained).await.unwrap();

        let err = executor
            .execute("p1", &approved(Side::Buy, dec!(10)), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::Trade(TradeError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.execution_count().await, 0);
        assert_eq!(ledger.portfolio("p1").await.unwrap().cash_balance, dec!(500));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_cannot_overdraw() {
        let ledger = ledger(dec!(1500));
        let executor = Arc::new(Executor::new(ledger.clone()));

        let a = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute("p1", &approved(Side::Buy, dec!(10)), None).await })
        };
        let b = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.execute("p1", &approved(Side::Buy, dec!(10)), None).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let succeeded = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(succeeded, 1);
        assert_eq!(ledger.portfolio("p1").await.unwrap().cash_balance, dec!(500));
    }

    /// Quotes for a fixed set of tickers.
    struct Quotes(Vec<(&'static str, rust_decimal::Decimal)>);

    #[async_trait]
    impl MarketData for Quotes {
        async fn latest_price(&self, ticker: &str) -> Result<rust_decimal::Decimal, DataError> {
            self.0
                .iter()
                .find(|(t, _)| *t == ticker)
                .map(|(_, p)| *p)
                .ok_or_else(|| DataError::TickerNotFound(ticker.to_string()))
        }

        async fn daily_closes(&self, ticker: &str, _: usize) -> Result<Vec<f64>, DataError> {
            Err(DataError::NoDataAvailable(ticker.to_string()))
        }

        fn name(&self) -> &str {
            "Quotes"
        }
    }

    #[tokio::test]
    async fn test_commit_carries_market_marks() {
        let ledger = Arc::new(MemoryLedger::new().with_portfolio(
            Portfolio::new("p1", "alice", dec!(10000))
                .with_position(Position::new("AAA", dec!(10), dec!(80)))
                .with_position(Position::new("BBB", dec!(5), dec!(40))),
        ));
        let executor = Executor::new(ledger.clone())
            .with_market(Arc::new(Quotes(vec![("AAA", dec!(120))])));

        executor
            .execute("p1", &approved(Side::Buy, dec!(10)), None)
            .await
            .unwrap();

        let portfolio = ledger.portfolio("p1").await.unwrap();
        let aaa = portfolio.position("AAA").unwrap();
        assert_eq!(aaa.current_price, dec!(120));
        assert_eq!(aaa.average_price, dec!(90));
        // Unquoted BBB keeps its stored mark.
        assert_eq!(portfolio.position("BBB").unwrap().current_price, dec!(40));
        assert_eq!(portfolio.cash_balance, dec!(9000));
    }

    /// Ledger whose version moves on every read.
    struct ChurningLedger {
        inner: MemoryLedger,
        reads: AtomicU32,
    }

    #[async_trait]
    impl PortfolioLedger for ChurningLedger {
        async fn portfolio(&self, portfolio_id: &str) -> Result<Portfolio, LedgerError> {
            let portfolio = self.inner.portfolio(portfolio_id).await?;
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(portfolio.clone()).await?;
            Ok(portfolio)
        }

        async fn execution_for(&self, proposal_id: Uuid) -> Result<Option<ExecutionResult>, LedgerError> {
            self.inner.execution_for(proposal_id).await
        }

        async fn commit(
            &self,
            expected_version: u64,
            portfolio: Portfolio,
            execution: ExecutionResult,
        ) -> Result<Portfolio, LedgerError> {
            self.inner.commit(expected_version, portfolio, execution).await
        }

        async fn upsert(&self, portfolio: Portfolio) -> Result<Portfolio, LedgerError> {
            self.inner.upsert(portfolio).await
        }
    }

    #[tokio::test]
    async fn test_stale_state_after_retries() {
        let ledger = Arc::new(ChurningLedger {
            inner: MemoryLedger::new().with_portfolio(Portfolio::new("p1", "a", dec!(10000))),
            reads: AtomicU32::new(0),
        });
        let executor = Executor::new(ledger.clone()).with_config(ExecutorConfig {
            max_commit_retries: 2,
        });

        let err = executor
            .execute("p1", &approved(Side::Buy, dec!(1)), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::StaleState { .. }));
        assert_eq!(ledger.reads.load(Ordering::SeqCst), 2);
        assert_eq!(ledger.inner.execution_count().await, 0);
    }
}
