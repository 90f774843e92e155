//! In-memory market data.

use advisor_core::error::DataError;
use advisor_core::traits::MarketData;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Book {
    prices: HashMap<String, Decimal>,
    closes: HashMap<String, Vec<f64>>,
    sectors: HashMap<String, String>,
}

/// Market data held in memory, for tests, demos and replay.
///
/// A ticker's latest price is its explicit quote if one was set, otherwise its
/// last close.
#[derive(Debug, Default)]
pub struct StaticMarketData {
    book: RwLock<Book>,
}

impl StaticMarketData {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a quote (builder style).
    pub fn with_price(mut self, ticker: &str, price: Decimal) -> Self {
        self.book.get_mut().prices.insert(ticker.to_string(), price);
        self
    }

    /// Set closing prices, oldest first (builder style).
    pub fn with_closes(mut self, ticker: &str, closes: Vec<f64>) -> Self {
        self.book.get_mut().closes.insert(ticker.to_string(), closes);
        self
    }

    /// Set a sector label (builder style).
    pub fn with_sector(mut self, ticker: &str, sector: &str) -> Self {
        self.book
            .get_mut()
            .sectors
            .insert(ticker.to_string(), sector.to_string());
        self
    }

    /// Update a quote.
    pub async fn set_price(&self, ticker: &str, price: Decimal) {
        self.book.write().await.prices.insert(ticker.to_string(), price);
    }

    /// Remove all data for a ticker.
    pub async fn remove(&self, ticker: &str) {
        let mut book = self.book.write().await;
        book.prices.remove(ticker);
        book.closes.remove(ticker);
        book.sectors.remove(ticker);
    }
}

#[async_trait]
impl MarketData for StaticMarketData {
    async fn latest_price(&self, ticker: &str) -> Result<Decimal, DataError> {
        let book = self.book.read().await;
        if let Some(price) = book.prices.get(ticker) {
            return Ok(*price);
        }

        let close = book
            .closes
            .get(ticker)
            .and_then(|c| c.last().copied())
            .ok_or_else(|| DataError::TickerNotFound(ticker.to_string()))?;

        Decimal::try_from(close).map_err(|e| DataError::ParseError(e.to_string()))
    }

    async fn daily_closes(&self, ticker: &str, observations: usize) -> Result<Vec<f64>, DataError> {
        let book = self.book.read().await;
        let closes = book
            .closes
            .get(ticker)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DataError::NoDataAvailable(ticker.to_string()))?;

        Ok(closes[closes.len().saturating_sub(observations)..].to_vec())
    }

    async fn sector(&self, ticker: &str) -> Result<Option<String>, DataError> {
        Ok(self.book.read().await.sectors.get(ticker).cloned())
    }

    fn name(&self) -> &str {
        "Static"
    }
}
