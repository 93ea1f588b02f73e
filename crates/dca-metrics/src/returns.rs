//! Daily return series.

use dca_core::types::PriceSeries;

use crate::simd::returns_simd;

/// Daily simple returns of a series: `close[t] / close[t-1] - 1`.
pub fn simple_returns(series: &PriceSeries) -> Vec<f64> {
    returns_simd(&series.closes())
}

/// Daily simple returns keyed by the timestamp of the later observation.
///
/// Used to align return series across assets by date.
pub fn timestamped_returns(series: &PriceSeries) -> Vec<(i64, f64)> {
    let returns = simple_returns(series);
    series
        .points()
        .iter()
        .skip(1)
        .map(|p| p.timestamp)
        .zip(returns)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_core::types::PricePoint;

    #[test]
    fn test_timestamped_returns() {
        let series = PriceSeries::from_points(
            "ETH",
            vec![
                PricePoint::new(10, 100.0, 1.0),
                PricePoint::new(20, 110.0, 1.0),
                PricePoint::new(40, 99.0, 1.0),
            ],
        )
        .unwrap();

        let returns = timestamped_returns(&series);
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].0, 20);
        assert!((returns[0].1 - 0.1).abs() < 1e-12);
        assert_eq!(returns[1].0, 40);
        assert!((returns[1].1 + 0.1).abs() < 1e-12);
    }
}
