//! Daily-return history window.

use std::collections::HashMap;

/// Convert closing prices (oldest first) to simple daily returns.
///
/// Non-positive or non-finite closes break the chain; returns touching them
/// are dropped.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[0].is_finite() && w[1].is_finite())
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Daily returns per ticker plus the benchmark, trimmed to a lookback window.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    returns: HashMap<String, Vec<f64>>,
    benchmark: Option<Vec<f64>>,
    lookback: usize,
}

impl PriceHistory {
    /// Create an empty history keeping at most `lookback` returns per series.
    pub fn new(lookback: usize) -> Self {
        Self {
            returns: HashMap::new(),
            benchmark: None,
            lookback,
        }
    }

    fn trim(&self, mut series: Vec<f64>) -> Vec<f64> {
        if self.lookback > 0 && series.len() > self.lookback {
            series.drain(..series.len() - self.lookback);
        }
        series
    }

    /// Add a ticker's return series.
    pub fn insert_returns(&mut self, ticker: impl Into<String>, returns: Vec<f64>) {
        let returns = self.trim(returns);
        self.returns.insert(ticker.into(), returns);
    }

    /// Add a ticker's closing prices.
    pub fn insert_closes(&mut self, ticker: impl Into<String>, closes: &[f64]) {
        self.insert_returns(ticker, daily_returns(closes));
    }

    /// Set the benchmark return series.
    pub fn set_benchmark_returns(&mut self, returns: Vec<f64>) {
        self.benchmark = Some(self.trim(returns));
    }

    /// Set the benchmark from closing prices.
    pub fn set_benchmark_closes(&mut self, closes: &[f64]) {
        self.set_benchmark_returns(daily_returns(closes));
    }

    /// Return series for a ticker, if it has at least one observation.
    pub fn returns(&self, ticker: &str) -> Option<&[f64]> {
        self.returns
            .get(ticker)
            .filter(|r| !r.is_empty())
            .map(Vec::as_slice)
    }

    /// Benchmark return series, if present.
    pub fn benchmark(&self) -> Option<&[f64]> {
        self.benchmark
            .as_deref()
            .filter(|r| !r.is_empty())
    }

    /// Check if no ticker has any observation.
    pub fn is_empty(&self) -> bool {
        self.returns.values().all(Vec::is_empty)
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_daily_returns_skips_bad_closes() {
        assert!(daily_returns(&[0.0, 10.0]).is_empty());
        assert!(daily_returns(&[5.0]).is_empty());
    }

    #[test]
    fn test_lookback_keeps_most_recent() {
        let mut history = PriceHistory::new(2);
        history.insert_returns("X", vec![0.1, 0.2, 0.3]);
        assert_eq!(history.returns("X").unwrap(), &[0.2, 0.3]);
    }

    #[test]
    fn test_empty_series_counts_as_missing() {
        let mut history = PriceHistory::new(60);
        history.insert_closes("X", &[100.0]);
        assert!(history.returns("X").is_none());
        assert!(history.is_empty());
    }
}
