//! Portfolio simulator.

use advisor_core::error::SimulationError;
use advisor_core::traits::{mark_to_market, MarketData};
use advisor_core::types::{Portfolio, RiskSnapshot, Side, TradeProposal};
use advisor_risk::{PriceHistory, RiskEngine};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Before and after views of a hypothetical trade.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub before: Portfolio,
    pub after: Portfolio,
    pub risk_before: RiskSnapshot,
    pub risk_after: RiskSnapshot,
}

/// Applies proposals to portfolio copies and assesses both sides.
pub struct PortfolioSimulator {
    engine: RiskEngine,
    market: Arc<dyn MarketData>,
}

impl PortfolioSimulator {
    pub fn new(engine: RiskEngine, market: Arc<dyn MarketData>) -> Self {
        Self { engine, market }
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    /// Simulate a proposal against a portfolio.
    ///
    /// The input portfolio is never modified. Both views are marked to the
    /// latest market prices before the trade is applied, so weights reflect
    /// market value rather than cost. Funds and holdings failures surface as
    /// [`SimulationError::Trade`].
    pub async fn simulate(
        &self,
        portfolio: &Portfolio,
        proposal: &TradeProposal,
    ) -> Result<Simulation, SimulationError> {
        let before = self.marked(portfolio).await;
        let sector = self.sector_for_new_position(&before, proposal).await;

        let mut after = before.clone();
        after.apply_trade(
            proposal.side,
            &proposal.ticker,
            proposal.quantity,
            proposal.price,
            sector,
        )?;

        let tickers: BTreeSet<String> = before
            .positions
            .iter()
            .chain(after.positions.iter())
            .map(|p| p.ticker.clone())
            .collect();
        let history = self.load_history(&tickers).await;

        let risk_before = self.engine.assess(&before, &history)?;
        let risk_after = self.engine.assess(&after, &history)?;

        debug!(
            proposal_id = %proposal.id,
            ticker = %proposal.ticker,
            concentration_before = risk_before.concentration_index,
            concentration_after = risk_after.concentration_index,
            "Simulation complete"
        );

        Ok(Simulation {
            before,
            after,
            risk_before,
            risk_after,
        })
    }

    /// Assess a portfolio at current market prices, without a trade.
    pub async fn assess(&self, portfolio: &Portfolio) -> Result<RiskSnapshot, SimulationError> {
        let marked = self.marked(portfolio).await;
        let tickers: BTreeSet<String> =
            marked.positions.iter().map(|p| p.ticker.clone()).collect();
        let history = self.load_history(&tickers).await;
        self.engine.assess(&marked, &history)
    }

    /// Copy of `portfolio` marked to market; unpriced positions keep their mark.
    async fn marked(&self, portfolio: &Portfolio) -> Portfolio {
        let mut marked = portfolio.clone();
        let stale = mark_to_market(&mut marked, self.market.as_ref()).await;
        if !stale.is_empty() {
            debug!(portfolio_id = %portfolio.id, tickers = ?stale, "Keeping stored marks");
        }
        marked
    }

    async fn sector_for_new_position(
        &self,
        portfolio: &Portfolio,
        proposal: &TradeProposal,
    ) -> Option<String> {
        if proposal.side != Side::Buy || portfolio.position(&proposal.ticker).is_some() {
            return None;
        }

        match self.market.sector(&proposal.ticker).await {
            Ok(sector) => sector,
            Err(e) => {
                warn!(ticker = %proposal.ticker, error = %e, "Sector lookup failed");
                None
            }
        }
    }

    /// Fetch closes for every ticker and the benchmark concurrently.
    ///
    /// Tickers whose fetch fails are left out of the history; the risk engine
    /// reports them as excluded.
    async fn load_history(&self, tickers: &BTreeSet<String>) -> PriceHistory {
        let config = self.engine.config();
        let observations = config.lookback + 1;
        let market = &self.market;

        let fetches = tickers.iter().map(|ticker| async move {
            (ticker, market.daily_closes(ticker, observations).await)
        });
        let (results, benchmark) = tokio::join!(
            join_all(fetches),
            market.daily_closes(&config.benchmark, observations)
        );

        let mut history = PriceHistory::new(config.lookback);
        for (ticker, result) in results {
            match result {
                Ok(closes) => history.insert_closes(ticker.clone(), &closes),
                Err(e) => debug!(ticker = %ticker, error = %e, "No price history"),
            }
        }

        match benchmark {
            Ok(closes) => history.set_benchmark_closes(&closes),
            Err(e) => debug!(benchmark = %config.benchmark, error = %e, "No benchmark history"),
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::error::TradeError;
    use advisor_core::types::{OrderKind, Position};
    use advisor_data::StaticMarketData;
    use advisor_risk::RiskConfig;
    use rust_decimal_macros::dec;

    fn closes(seed: f64) -> Vec<f64> {
        (0..80)
            .map(|i| 100.0 + seed * ((i as f64) * 0.7).sin() + i as f64 * 0.1)
            .collect()
    }

    fn simulator() -> PortfolioSimulator {
        let market = StaticMarketData::new()
            .with_closes("X", closes(3.0))
            .with_closes("Y", closes(1.0))
            .with_closes("KOSPI", closes(2.0))
            .with_sector("X", "Semiconductors");
        PortfolioSimulator::new(RiskEngine::new(RiskConfig::default()), Arc::new(market))
    }

    fn scenario_portfolio() -> Portfolio {
        Portfolio::new("p1", "alice", dec!(10000000))
    }

    #[tokio::test]
    async fn test_buy_into_cash_portfolio() {
        let portfolio = scenario_portfolio();
        let proposal = TradeProposal::new("X", Side::Buy, dec!(100), dec!(75000), OrderKind::Limit).unwrap();

        let sim = simulator().simulate(&portfolio, &proposal).await.unwrap();

        assert_eq!(sim.after.cash_balance, dec!(2500000));
        assert_eq!(sim.after.positions.len(), 1);
        assert_eq!(sim.after.total_value(), dec!(10000000));
        assert!((sim.risk_after.position_weights["X"] - 0.75).abs() < 1e-12);
        assert!((sim.risk_after.weight_sum() - 1.0).abs() < 1e-6);
        assert_eq!(sim.after.positions[0].sector.as_deref(), Some("Semiconductors"));

        // Cash-only "before" has no market exposure to measure.
        assert!(sim.risk_before.is_empty());
        assert!(sim.risk_after.portfolio_volatility.is_some());
        assert_eq!(portfolio, scenario_portfolio());
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_portfolio_unchanged() {
        let portfolio = scenario_portfolio();
        let proposal = TradeProposal::new("X", Side::Buy, dec!(200), dec!(75000), OrderKind::Limit).unwrap();

        let err = simulator().simulate(&portfolio, &proposal).await.unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Trade(TradeError::InsufficientFunds { .. })
        ));
        assert!(err.is_correctable());
        assert_eq!(portfolio, scenario_portfolio());
    }

    #[tokio::test]
    async fn test_missing_history_is_excluded() {
        let portfolio = scenario_portfolio()
            .with_position(Position::new("Y", dec!(100), dec!(10000)))
            .with_position(Position::new("NOHIST", dec!(10), dec!(10000)));
        let proposal = TradeProposal::new("Y", Side::Sell, dec!(50), dec!(10000), OrderKind::Limit).unwrap();

        let sim = simulator().simulate(&portfolio, &proposal).await.unwrap();

        assert_eq!(sim.risk_before.excluded_tickers, vec!["NOHIST".to_string()]);
        assert!(sim.risk_before.portfolio_volatility.is_some());
        assert_eq!(sim.after.held_quantity("Y"), dec!(50));
    }

    #[tokio::test]
    async fn test_positions_are_marked_to_market() {
        let market = StaticMarketData::new()
            .with_price("Y", dec!(150))
            .with_closes("Y", closes(1.0))
            .with_closes("KOSPI", closes(2.0));
        let sim = PortfolioSimulator::new(RiskEngine::default(), Arc::new(market));
        // Y bought at 100, now quoted at 150; NOHIST has no quote.
        let portfolio = Portfolio::new("p1", "alice", dec!(5000))
            .with_position(Position::new("Y", dec!(100), dec!(100)))
            .with_position(Position::new("NOHIST", dec!(10), dec!(500)));
        let proposal = TradeProposal::new("Y", Side::Buy, dec!(10), dec!(150), OrderKind::Limit)
            .unwrap();

        let result = sim.simulate(&portfolio, &proposal).await.unwrap();

        let y = result.before.position("Y").unwrap();
        assert_eq!(y.current_price, dec!(150));
        assert_eq!(y.average_price, dec!(100));
        assert_eq!(result.before.position("NOHIST").unwrap().current_price, dec!(500));
        // 15000 + 5000 + 5000 cash
        assert_eq!(result.before.total_value(), dec!(25000));
        assert!((result.risk_before.position_weights["Y"] - 0.6).abs() < 1e-12);
        assert_eq!(result.before.view().positions[0].unrealized_pnl, dec!(5000));

        // New shares are valued at the current mark, not the old one.
        let y_after = result.after.position("Y").unwrap();
        assert_eq!(y_after.current_price, dec!(150));
        assert_eq!(result.after.total_value(), dec!(25000));
        assert!((result.risk_after.position_weights["Y"] - 0.66).abs() < 1e-12);

        assert_eq!(sim.assess(&portfolio).await.unwrap(), result.risk_before);
        // The caller's copy keeps its stored marks.
        assert_eq!(portfolio.position("Y").unwrap().current_price, dec!(100));
    }

    #[tokio::test]
    async fn test_simulation_is_deterministic() {
        let sim = simulator();
        let portfolio = scenario_portfolio().with_position(Position::new("Y", dec!(10), dec!(100)));
        let proposal = TradeProposal::new("X", Side::Buy, dec!(10), dec!(75000), OrderKind::Limit).unwrap();

        let first = sim.simulate(&portfolio, &proposal).await.unwrap();
        let second = sim.simulate(&portfolio, &proposal).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sim.assess(&portfolio).await.unwrap(), first.risk_before);
    }
}
