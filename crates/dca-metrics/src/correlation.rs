//! Pairwise return correlation.

use dca_core::types::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::returns::timestamped_returns;
use crate::simd::{center_simd, dot_product_simd};

/// Correlation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Overlapping return observations required before a pair is measured.
    /// Pairs below this are reported as uncorrelated.
    pub min_overlap: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self { min_overlap: 2 }
    }
}

/// Symmetric matrix of Pearson correlations between daily return series.
///
/// Symbols are kept sorted so the layout does not depend on input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Build from return series keyed by the timestamp of each return.
    ///
    /// Each pair is computed over the intersection of its timestamps.
    pub fn from_returns(
        returns: &BTreeMap<String, Vec<(i64, f64)>>,
        config: &CorrelationConfig,
    ) -> Self {
        let symbols: Vec<String> = returns.keys().cloned().collect();
        let series: Vec<&Vec<(i64, f64)>> = returns.values().collect();
        let n = symbols.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let (a, b) = aligned(series[i], series[j]);
                let rho = if a.len() < config.min_overlap.max(2) {
                    0.0
                } else {
                    pearson(&a, &b)
                };
                values[i * n + j] = rho;
                values[j * n + i] = rho;
            }
        }

        Self { symbols, values }
    }

    /// Build from price histories.
    pub fn from_histories(
        histories: &BTreeMap<String, PriceSeries>,
        config: &CorrelationConfig,
    ) -> Self {
        let returns: BTreeMap<String, Vec<(i64, f64)>> = histories
            .iter()
            .map(|(symbol, series)| (symbol.clone(), timestamped_returns(series)))
            .collect();
        Self::from_returns(&returns, config)
    }

    fn index(&self, symbol: &str) -> Option<usize> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    /// Correlation between two symbols.
    ///
    /// A symbol with itself is 1. Unknown symbols are treated as uncorrelated.
    pub fn get(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => self.values[i * self.symbols.len() + j],
            _ => 0.0,
        }
    }

    /// Symbols covered by the matrix, sorted.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Mean absolute off-diagonal correlation among `symbols`. 0 with fewer than two.
    pub fn average_abs_correlation(&self, symbols: &[String]) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, a) in symbols.iter().enumerate() {
            for b in &symbols[i + 1..] {
                total += self.get(a, b).abs();
                pairs += 1;
            }
        }
        if pairs == 0 {
            0.0
        } else {
            total / pairs as f64
        }
    }
}

/// Merge-join two timestamp-sorted return series on their shared timestamps.
fn aligned(a: &[(i64, f64)], b: &[(i64, f64)]) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(a.len().min(b.len()));
    let mut ys = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                xs.push(a[i].1);
                ys.push(b[j].1);
                i += 1;
                j += 1;
            }
        }
    }

    (xs, ys)
}

/// Pearson correlation. A zero-variance input yields 0.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let da = center_simd(a);
    let db = center_simd(b);
    let var_a = dot_product_simd(&da, &da);
    let var_b = dot_product_simd(&db, &db);
    let denom = (var_a * var_b).sqrt();
    if !denom.is_finite() || denom <= f64::EPSILON {
        return 0.0;
    }
    (dot_product_simd(&da, &db) / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns(values: &[f64]) -> Vec<(i64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &r)| (i as i64, r))
            .collect()
    }

    fn matrix(entries: &[(&str, Vec<(i64, f64)>)]) -> CorrelationMatrix {
        let map: BTreeMap<String, Vec<(i64, f64)>> = entries
            .iter()
            .map(|(s, r)| (s.to_string(), r.clone()))
            .collect();
        CorrelationMatrix::from_returns(&map, &CorrelationConfig::default())
    }

    #[test]
    fn test_perfect_correlation() {
        let m = matrix(&[
            ("A", returns(&[0.01, 0.02, -0.01, 0.03])),
            ("B", returns(&[0.02, 0.04, -0.02, 0.06])),
            ("C", returns(&[-0.01, -0.02, 0.01, -0.03])),
        ]);
        assert!((m.get("A", "B") - 1.0).abs() < 1e-12);
        assert!((m.get("A", "C") + 1.0).abs() < 1e-12);
        assert_eq!(m.get("A", "B"), m.get("B", "A"));
        assert_eq!(m.get("A", "A"), 1.0);
    }

    #[test]
    fn test_zero_variance_is_uncorrelated() {
        let m = matrix(&[
            ("STABLE", returns(&[0.0, 0.0, 0.0, 0.0])),
            ("BTC", returns(&[0.01, -0.02, 0.03, 0.01])),
        ]);
        assert_eq!(m.get("STABLE", "BTC"), 0.0);
    }

    #[test]
    fn test_uses_overlapping_timestamps_only() {
        let a = vec![(1, 0.01), (2, 0.02), (3, -0.01), (4, 0.5)];
        let b = vec![(0, -0.9), (1, 0.02), (2, 0.04), (3, -0.02)];
        let m = matrix(&[("A", a), ("B", b)]);
        assert!((m.get("A", "B") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_overlap() {
        let m = matrix(&[("A", vec![(1, 0.01)]), ("B", vec![(1, 0.02)])]);
        assert_eq!(m.get("A", "B"), 0.0);
    }

    #[test]
    fn test_unknown_symbol() {
        let m = matrix(&[("A", returns(&[0.01, 0.02]))]);
        assert_eq!(m.get("A", "ZZZ"), 0.0);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_average_abs_correlation() {
        let m = matrix(&[
            ("A", returns(&[0.01, 0.02, -0.01, 0.03])),
            ("B", returns(&[0.02, 0.04, -0.02, 0.06])),
            ("C", returns(&[-0.01, -0.02, 0.01, -0.03])),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert!((m.average_abs_correlation(&symbols) - 1.0).abs() < 1e-12);
        assert_eq!(m.average_abs_correlation(&symbols[..1]), 0.0);
    }
}
