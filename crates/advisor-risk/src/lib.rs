//! Risk metrics for portfolio views.
//!
//! Provides concentration, volatility, Value-at-Risk, beta and drawdown
//! estimates computed from a portfolio and a window of daily returns. Every
//! function here is pure; fetching the history is the caller's job.

mod engine;
mod history;
mod policy;
mod stats;

pub use engine::{RiskConfig, RiskEngine};
pub use history::{daily_returns, PriceHistory};
pub use policy::{
    concentration_level, var_level, CONCENTRATION_HIGH, CONCENTRATION_MEDIUM,
    DEFAULT_LOOKBACK, DEFAULT_MIN_BETA_OBSERVATIONS, FALLBACK_BETA, VAR_HIGH, VAR_MEDIUM,
    Z_SCORE_95,
};
