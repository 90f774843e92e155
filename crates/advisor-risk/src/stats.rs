//! Return-series statistics.

use statrs::statistics::Statistics;

/// Most recent `n` items of a series.
pub(crate) fn tail(series: &[f64], n: usize) -> &[f64] {
    &series[series.len().saturating_sub(n)..]
}

/// Weighted portfolio return series over the common tail of all inputs.
pub(crate) fn weighted_returns(components: &[(f64, &[f64])]) -> Vec<f64> {
    let n = components
        .iter()
        .map(|(_, r)| r.len())
        .min()
        .unwrap_or(0);

    (0..n)
        .map(|t| {
            components
                .iter()
                .map(|(w, r)| w * tail(r, n)[t])
                .sum()
        })
        .collect()
}

/// Sample standard deviation, `None` below two observations.
pub(crate) fn volatility(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    Some(series.iter().std_dev())
}

/// `cov(asset, benchmark) / var(benchmark)` over the common tail.
///
/// `None` when fewer than `min_observations` overlap or the benchmark has no
/// variance.
pub(crate) fn beta(asset: &[f64], benchmark: &[f64], min_observations: usize) -> Option<f64> {
    let n = asset.len().min(benchmark.len());
    if n < min_observations.max(2) {
        return None;
    }

    let asset = tail(asset, n);
    let benchmark = tail(benchmark, n);
    let variance = benchmark.iter().variance();
    if !(variance > 0.0) {
        return None;
    }

    let covariance = asset.iter().covariance(benchmark.iter());
    Some(covariance / variance)
}

/// Largest peak-to-trough decline of cumulative wealth, `None` below two
/// observations.
pub(crate) fn max_drawdown(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let mut wealth = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for r in series {
        wealth *= 1.0 + r;
        peak = peak.max(wealth);
        if peak > 0.0 {
            worst = worst.max((peak - wealth) / peak);
        }
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_returns_aligns_tails() {
        let a = [0.5, 0.01, 0.02];
        let b = [0.03, 0.04];
        let series = weighted_returns(&[(0.5, &a), (0.5, &b)]);
        assert_eq!(series.len(), 2);
        assert!((series[0] - 0.02).abs() < 1e-12);
        assert!((series[1] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_needs_two_points() {
        assert!(volatility(&[0.01]).is_none());
        let v = volatility(&[0.01, -0.01]).unwrap();
        assert!((v - 0.014142135623730951).abs() < 1e-12);
    }

    #[test]
    fn test_beta_of_scaled_series() {
        let benchmark: Vec<f64> = (0..30).map(|i| ((i % 5) as f64 - 2.0) / 100.0).collect();
        let asset: Vec<f64> = benchmark.iter().map(|r| 2.0 * r).collect();
        let b = beta(&asset, &benchmark, 20).unwrap();
        assert!((b - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_beta_insufficient_or_flat() {
        assert!(beta(&[0.01; 5], &[0.02; 5], 20).is_none());
        assert!(beta(&[0.01; 30], &[0.0; 30], 20).is_none());
    }

    #[test]
    fn test_max_drawdown() {
        let dd = max_drawdown(&[0.10, -0.50, 0.20]).unwrap();
        assert!((dd - 0.5).abs() < 1e-12);
        assert_eq!(max_drawdown(&[0.01, 0.02]), Some(0.0));
        assert!(max_drawdown(&[0.01]).is_none());
    }
}
