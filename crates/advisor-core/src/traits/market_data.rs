//! Market data trait definition.

use crate::error::DataError;
use crate::types::Portfolio;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Source of prices for proposal pricing and risk calculations.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Get the latest traded price for a ticker.
    async fn latest_price(&self, ticker: &str) -> Result<Decimal, DataError>;

    /// Get daily closing prices, oldest first.
    ///
    /// # Arguments
    /// * `ticker` - The ticker (or benchmark index) to fetch
    /// * `observations` - Maximum number of closes to return, counted from the
    ///   most recent
    async fn daily_closes(&self, ticker: &str, observations: usize) -> Result<Vec<f64>, DataError>;

    /// Get the sector a ticker belongs to, if known.
    async fn sector(&self, _ticker: &str) -> Result<Option<String>, DataError> {
        Ok(None)
    }

    /// Get the data source name.
    fn name(&self) -> &str;
}

/// Refresh every position's `current_price` from `market`.
///
/// A position whose lookup fails, or returns a non-positive price, keeps its
/// stored mark. Returns the tickers that were not refreshed.
pub async fn mark_to_market(portfolio: &mut Portfolio, market: &dyn MarketData) -> Vec<String> {
    let mut stale = Vec::new();
    for position in &mut portfolio.positions {
        match market.latest_price(&position.ticker).await {
            Ok(price) if price > Decimal::ZERO => position.current_price = price,
            _ => stale.push(position.ticker.clone()),
        }
    }
    stale
}
