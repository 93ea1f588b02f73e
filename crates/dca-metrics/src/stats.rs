//! Shared return statistics.

use statrs::statistics::Statistics;

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Volatility at or below this is treated as zero.
pub const VOLATILITY_EPSILON: f64 = 1e-12;

/// Sample standard deviation of returns, annualized. Fewer than two returns yields 0.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std_dev = returns.std_dev();
    if std_dev.is_finite() {
        std_dev * periods_per_year.sqrt()
    } else {
        0.0
    }
}

/// `(mean * periods - risk_free_rate) / annualized_volatility`, 0 when volatility is 0.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let volatility = annualized_volatility(returns, periods_per_year);
    if volatility <= VOLATILITY_EPSILON {
        return 0.0;
    }
    let annual_return = returns.mean() * periods_per_year;
    (annual_return - risk_free_rate) / volatility
}

/// `mean * sqrt(periods) / stdev(negative returns)`.
///
/// 0 when fewer than two returns are negative or the downside deviation is 0.
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return 0.0;
    }
    let downside_dev = downside.std_dev();
    if !downside_dev.is_finite() || downside_dev <= VOLATILITY_EPSILON {
        return 0.0;
    }
    returns.mean() * periods_per_year.sqrt() / downside_dev
}

/// Deepest decline from a running peak, as a fraction (zero or negative).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in values {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.min(value / peak - 1.0);
        }
    }
    worst
}

/// `last / first - 1`, 0 when the series is too short or starts at a non-positive price.
pub fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 && first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volatility_of_constant_returns_is_zero() {
        assert_eq!(annualized_volatility(&[0.0, 0.0, 0.0], PERIODS_PER_YEAR), 0.0);
        assert_eq!(sharpe_ratio(&[0.0, 0.0, 0.0], 0.02, PERIODS_PER_YEAR), 0.0);
    }

    #[test]
    fn test_volatility_uses_sample_deviation() {
        // Sample std dev of [0.01, -0.01] is sqrt(0.0002)
        let vol = annualized_volatility(&[0.01, -0.01], PERIODS_PER_YEAR);
        let expected = 0.0002_f64.sqrt() * PERIODS_PER_YEAR.sqrt();
        assert!((vol - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_subtracts_risk_free_rate() {
        let returns = [0.02, -0.01, 0.015, 0.0, 0.005];
        let with_rf = sharpe_ratio(&returns, 0.05, PERIODS_PER_YEAR);
        let without_rf = sharpe_ratio(&returns, 0.0, PERIODS_PER_YEAR);
        let vol = annualized_volatility(&returns, PERIODS_PER_YEAR);
        assert!((without_rf - with_rf - 0.05 / vol).abs() < 1e-9);
    }

    #[test]
    fn test_sortino_needs_two_losses() {
        assert_eq!(sortino_ratio(&[0.01, -0.02, 0.03], PERIODS_PER_YEAR), 0.0);
        assert!(sortino_ratio(&[0.05, -0.01, -0.02, 0.03], PERIODS_PER_YEAR) > 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let values = [100.0, 120.0, 90.0, 110.0, 130.0];
        assert!((max_drawdown(&values) + 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_total_return() {
        assert!((total_return(&[100.0, 150.0]) - 0.5).abs() < 1e-12);
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[0.0, 5.0]), 0.0);
    }
}
