//! Risk snapshot types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "moderate" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Risk metrics for one view of a portfolio.
///
/// Market-risk fields are `None` when no price history was available for the
/// portfolio; they are never filled with made-up values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    /// Σ weight² over positions (Herfindahl index)
    pub concentration_index: f64,
    pub top_position_weight: f64,
    /// Largest sector weight, `None` when no position carries a sector
    pub top_sector_weight: Option<f64>,
    pub portfolio_volatility: Option<f64>,
    pub value_at_risk_95: Option<f64>,
    pub portfolio_beta: Option<f64>,
    pub max_drawdown_estimate: Option<f64>,
    pub concentration_level: RiskLevel,
    pub var_level: Option<RiskLevel>,
    /// Weight of each position against total value
    pub position_weights: BTreeMap<String, f64>,
    pub cash_weight: f64,
    /// Tickers left out of volatility and beta for lack of price history
    #[serde(default)]
    pub excluded_tickers: Vec<String>,
}

impl RiskSnapshot {
    /// Check whether the snapshot carries no market-risk data.
    pub fn is_empty(&self) -> bool {
        self.portfolio_volatility.is_none()
            && self.value_at_risk_95.is_none()
            && self.portfolio_beta.is_none()
            && self.max_drawdown_estimate.is_none()
    }

    /// Sum of position weights plus cash weight.
    pub fn weight_sum(&self) -> f64 {
        self.position_weights.values().sum::<f64>() + self.cash_weight
    }

    /// Highest of the concentration and VaR levels.
    pub fn overall_level(&self) -> RiskLevel {
        self.var_level
            .map_or(self.concentration_level, |v| v.max(self.concentration_level))
    }

    /// Metric-wise difference `after - self`.
    pub fn delta_to(&self, after: &RiskSnapshot) -> RiskDelta {
        fn diff(before: Option<f64>, after: Option<f64>) -> Option<f64> {
            Some(after? - before?)
        }

        RiskDelta {
            concentration_index: after.concentration_index - self.concentration_index,
            top_position_weight: after.top_position_weight - self.top_position_weight,
            top_sector_weight: diff(self.top_sector_weight, after.top_sector_weight),
            portfolio_volatility: diff(self.portfolio_volatility, after.portfolio_volatility),
            value_at_risk_95: diff(self.value_at_risk_95, after.value_at_risk_95),
            portfolio_beta: diff(self.portfolio_beta, after.portfolio_beta),
            max_drawdown_estimate: diff(self.max_drawdown_estimate, after.max_drawdown_estimate),
        }
    }
}

/// Change in each risk metric caused by a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDelta {
    pub concentration_index: f64,
    pub top_position_weight: f64,
    pub top_sector_weight: Option<f64>,
    pub portfolio_volatility: Option<f64>,
    pub value_at_risk_95: Option<f64>,
    pub portfolio_beta: Option<f64>,
    pub max_drawdown_estimate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(concentration: f64, volatility: Option<f64>) -> RiskSnapshot {
        RiskSnapshot {
            concentration_index: concentration,
            top_position_weight: concentration.sqrt(),
            top_sector_weight: None,
            portfolio_volatility: volatility,
            value_at_risk_95: volatility.map(|v| v * 1.65),
            portfolio_beta: None,
            max_drawdown_estimate: None,
            concentration_level: RiskLevel::Low,
            var_level: None,
            position_weights: BTreeMap::new(),
            cash_weight: 1.0,
            excluded_tickers: Vec::new(),
        }
    }

    #[test]
    fn test_delta_only_where_both_sides_known() {
        let before = snapshot(0.0, None);
        let after = snapshot(0.5625, Some(0.02));
        let delta = before.delta_to(&after);

        assert!((delta.concentration_index - 0.5625).abs() < 1e-12);
        assert!(delta.portfolio_volatility.is_none());
    }

    #[test]
    fn test_overall_level() {
        let mut s = snapshot(0.1, Some(0.01));
        s.var_level = Some(RiskLevel::High);
        assert_eq!(s.overall_level(), RiskLevel::High);
        s.var_level = None;
        assert_eq!(s.overall_level(), RiskLevel::Low);
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!("moderate".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!(RiskLevel::High > RiskLevel::Medium);
    }
}
