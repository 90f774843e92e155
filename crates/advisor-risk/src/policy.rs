//! Policy constants and level classification.
//!
//! These are parametric approximations kept for behavioral compatibility, not
//! validated risk models.

use advisor_core::types::RiskLevel;

/// One-tailed 95% z-score used for parametric VaR.
pub const Z_SCORE_95: f64 = 1.65;

/// Daily-return observations used by default.
pub const DEFAULT_LOOKBACK: usize = 60;

/// Returns a ticker needs before it counts toward volatility, VaR, beta and
/// drawdown; shorter series are excluded.
pub const DEFAULT_MIN_RETURN_OBSERVATIONS: usize = 2;

/// Minimum aligned observations for a ticker beta; below this the ticker gets
/// [`FALLBACK_BETA`].
pub const DEFAULT_MIN_BETA_OBSERVATIONS: usize = 20;

/// Beta assumed for tickers with too little history.
pub const FALLBACK_BETA: f64 = 1.0;

pub const CONCENTRATION_HIGH: f64 = 0.25;
pub const CONCENTRATION_MEDIUM: f64 = 0.15;

pub const VAR_HIGH: f64 = 0.10;
pub const VAR_MEDIUM: f64 = 0.05;

/// Classify a Herfindahl concentration index.
pub fn concentration_level(index: f64) -> RiskLevel {
    if index > CONCENTRATION_HIGH {
        RiskLevel::High
    } else if index > CONCENTRATION_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Classify a one-day 95% VaR (as a fraction of portfolio value).
pub fn var_level(var_95: f64) -> RiskLevel {
    if var_95 > VAR_HIGH {
        RiskLevel::High
    } else if var_95 > VAR_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concentration_thresholds_are_strict() {
        assert_eq!(concentration_level(0.25), RiskLevel::Medium);
        assert_eq!(concentration_level(0.2501), RiskLevel::High);
        assert_eq!(concentration_level(0.15), RiskLevel::Low);
        assert_eq!(concentration_level(0.16), RiskLevel::Medium);
    }

    #[test]
    fn test_var_thresholds() {
        assert_eq!(var_level(0.11), RiskLevel::High);
        assert_eq!(var_level(0.10), RiskLevel::Medium);
        assert_eq!(var_level(0.051), RiskLevel::Medium);
        assert_eq!(var_level(0.01), RiskLevel::Low);
    }
}
