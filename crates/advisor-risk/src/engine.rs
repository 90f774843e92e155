//! Risk engine.

use advisor_core::error::SimulationError;
use advisor_core::types::{Portfolio, RiskSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::history::PriceHistory;
use crate::policy::{
    concentration_level, var_level, DEFAULT_LOOKBACK, DEFAULT_MIN_BETA_OBSERVATIONS,
    DEFAULT_MIN_RETURN_OBSERVATIONS, FALLBACK_BETA, Z_SCORE_95,
};
use crate::stats;

/// Risk engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Daily-return observations per ticker
    pub lookback: usize,
    /// Returns required before a ticker counts toward market risk
    pub min_return_observations: usize,
    /// Aligned observations required before a ticker beta is trusted
    pub min_beta_observations: usize,
    /// Benchmark index ticker
    pub benchmark: String,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            min_return_observations: DEFAULT_MIN_RETURN_OBSERVATIONS,
            min_beta_observations: DEFAULT_MIN_BETA_OBSERVATIONS,
            benchmark: "KOSPI".to_string(),
        }
    }
}

/// Computes [`RiskSnapshot`]s from a portfolio and its price history.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    /// Create a new risk engine.
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess a portfolio.
    ///
    /// Tickers with fewer than `min_return_observations` returns are excluded
    /// from volatility, VaR, beta and drawdown and reported in
    /// `excluded_tickers`; the rest are aligned over their common tail. When
    /// no held ticker has enough history, all market-risk fields are `None`.
    pub fn assess(
        &self,
        portfolio: &Portfolio,
        history: &PriceHistory,
    ) -> Result<RiskSnapshot, SimulationError> {
        let view = portfolio.view();

        let position_weights: BTreeMap<String, f64> = view
            .positions
            .iter()
            .map(|p| (p.ticker.clone(), p.weight))
            .collect();

        let concentration_index: f64 = position_weights.values().map(|w| w * w).sum();
        let top_position_weight = position_weights.values().copied().fold(0.0, f64::max);

        let mut sectors: HashMap<&str, f64> = HashMap::new();
        for p in &view.positions {
            if let Some(sector) = p.sector.as_deref() {
                *sectors.entry(sector).or_insert(0.0) += p.weight;
            }
        }
        let top_sector_weight = sectors.values().copied().reduce(f64::max);

        let mut covered: Vec<(&str, f64, &[f64])> = Vec::new();
        let mut excluded_tickers = Vec::new();
        let min_returns = self.config.min_return_observations.max(2);
        for p in &view.positions {
            match history.returns(&p.ticker) {
                Some(returns) if returns.len() >= min_returns => {
                    covered.push((p.ticker.as_str(), p.weight, returns))
                }
                _ => excluded_tickers.push(p.ticker.clone()),
            }
        }

        let components: Vec<(f64, &[f64])> = covered.iter().map(|(_, w, r)| (*w, *r)).collect();
        let series = stats::weighted_returns(&components);

        let portfolio_volatility = if covered.is_empty() {
            None
        } else {
            stats::volatility(&series)
        };
        let value_at_risk_95 = portfolio_volatility.map(|v| v * Z_SCORE_95);
        let max_drawdown_estimate = if covered.is_empty() {
            None
        } else {
            stats::max_drawdown(&series)
        };
        let portfolio_beta = self.portfolio_beta(&covered, history.benchmark());

        if !excluded_tickers.is_empty() {
            debug!(
                portfolio_id = %portfolio.id,
                excluded = ?excluded_tickers,
                "Tickers without history excluded from market risk"
            );
        }

        let snapshot = RiskSnapshot {
            concentration_index,
            top_position_weight,
            top_sector_weight,
            portfolio_volatility,
            value_at_risk_95,
            portfolio_beta,
            max_drawdown_estimate,
            concentration_level: concentration_level(concentration_index),
            var_level: value_at_risk_95.map(var_level),
            position_weights,
            cash_weight: view.cash_weight,
            excluded_tickers,
        };

        check_finite(&snapshot)?;
        Ok(snapshot)
    }

    /// Weight-averaged beta over covered tickers.
    fn portfolio_beta(&self, covered: &[(&str, f64, &[f64])], benchmark: Option<&[f64]>) -> Option<f64> {
        let total_weight: f64 = covered.iter().map(|(_, w, _)| w).sum();
        if covered.is_empty() || total_weight <= 0.0 {
            return None;
        }

        let weighted: f64 = covered
            .iter()
            .map(|(ticker, weight, returns)| {
                let beta = benchmark
                    .and_then(|b| stats::beta(returns, b, self.config.min_beta_observations))
                    .unwrap_or_else(|| {
                        debug!(ticker, "Insufficient history for beta, using fallback");
                        FALLBACK_BETA
                    });
                weight * beta
            })
            .sum();

        Some(weighted / total_weight)
    }
}

fn check_finite(snapshot: &RiskSnapshot) -> Result<(), SimulationError> {
    let values = [
        Some(snapshot.concentration_index),
        Some(snapshot.top_position_weight),
        Some(snapshot.cash_weight),
        snapshot.top_sector_weight,
        snapshot.portfolio_volatility,
        snapshot.value_at_risk_95,
        snapshot.portfolio_beta,
        snapshot.max_drawdown_estimate,
    ];

    if values.iter().flatten().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SimulationError::Failure(
            "risk metrics produced a non-finite value".to_string(),
        ))
    }
}
