//! Score-proportional weight allocation with per-asset bounds.

use dca_core::error::{AllocationError, ConfigError};
use dca_core::types::TargetAllocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Residual below which the clamp/redistribute loop is considered converged.
const CONVERGENCE_EPSILON: f64 = 1e-12;

/// Weight allocator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    pub min_weight_per_asset: f64,
    pub max_weight_per_asset: f64,
    /// Cap on clamp/redistribute passes
    pub max_iterations: usize,
    /// Decimal places weights are rounded to
    pub precision: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_weight_per_asset: 0.05,
            max_weight_per_asset: 0.40,
            max_iterations: 10,
            precision: 3,
        }
    }
}

impl AllocatorConfig {
    /// Validate the bounds on their own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("min_weight_per_asset", self.min_weight_per_asset),
            ("max_weight_per_asset", self.max_weight_per_asset),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field: field.to_string(),
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if self.min_weight_per_asset > self.max_weight_per_asset {
            return Err(ConfigError::WeightBounds {
                min: self.min_weight_per_asset,
                max: self.max_weight_per_asset,
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that the bounds admit a full allocation for every basket size in
    /// `min_assets..=max_assets`.
    ///
    /// The configured range must be feasible without relaxation. The allocator only relaxes
    /// a bound to `1 / n` for baskets outside that range, which happens when the eligible
    /// universe is smaller than `min_assets`.
    pub fn validate_for_basket(&self, min_assets: usize, max_assets: usize) -> Result<(), ConfigError> {
        let floor_total = self.min_weight_per_asset * max_assets as f64;
        let ceiling_total = self.max_weight_per_asset * min_assets as f64;
        if floor_total > 1.0 + f64::EPSILON || ceiling_total < 1.0 - f64::EPSILON {
            return Err(ConfigError::InfeasibleWeightBounds {
                min_weight: self.min_weight_per_asset,
                max_weight: self.max_weight_per_asset,
                min_assets,
                max_assets,
            });
        }
        Ok(())
    }
}

/// Converts composite scores into bounded target weights.
#[derive(Debug, Clone, Default)]
pub struct WeightAllocator {
    config: AllocatorConfig,
}

impl WeightAllocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Bounds actually applied to a basket of `n` assets.
    ///
    /// When the basket is too small for the configured maximum (or too large for the
    /// minimum) to reach a total of 1.0, the offending bound is relaxed to `1 / n`. With a
    /// configuration accepted by [`AllocatorConfig::validate_for_basket`] this only applies
    /// to baskets outside `min_assets..=max_assets`.
    fn effective_bounds(&self, n: usize) -> (f64, f64) {
        let equal = 1.0 / n as f64;
        let min = self.config.min_weight_per_asset.min(equal);
        let max = self.config.max_weight_per_asset.max(equal);
        (min, max)
    }

    /// Allocate weights proportional to score.
    ///
    /// Raw weights are clamped into bounds and the surplus or deficit is spread
    /// proportionally over the assets not pinned at a bound, for at most `max_iterations`
    /// passes. Weights are then rounded and the largest weight absorbs the rounding drift
    /// so the total is exactly 1.
    pub fn allocate(&self, scores: &BTreeMap<String, f64>) -> Result<TargetAllocation, AllocationError> {
        if scores.is_empty() {
            return Err(AllocationError::EmptySelection);
        }

        let n = scores.len();
        let symbols: Vec<&String> = scores.keys().collect();
        let clean: Vec<f64> = scores
            .values()
            .map(|s| if s.is_finite() && *s > 0.0 { *s } else { 0.0 })
            .collect();
        let total: f64 = clean.iter().sum();

        let mut weights: Vec<f64> = if total > 0.0 {
            clean.iter().map(|s| s / total).collect()
        } else {
            debug!(assets = n, "all scores are zero, using equal weights");
            vec![1.0 / n as f64; n]
        };

        let (min_w, max_w) = self.effective_bounds(n);
        let mut converged = false;

        for iteration in 0..self.config.max_iterations {
            for w in weights.iter_mut() {
                *w = w.clamp(min_w, max_w);
            }

            let residual = 1.0 - weights.iter().sum::<f64>();
            if residual.abs() < CONVERGENCE_EPSILON {
                converged = true;
                debug!(iterations = iteration, "weight allocation converged");
                break;
            }

            // Assets that can still move in the direction of the residual
            let free: Vec<usize> = (0..n)
                .filter(|&i| {
                    if residual > 0.0 {
                        weights[i] < max_w
                    } else {
                        weights[i] > min_w
                    }
                })
                .collect();
            if free.is_empty() {
                break;
            }

            let free_total: f64 = free.iter().map(|&i| weights[i]).sum();
            for &i in &free {
                let share = if free_total > 0.0 {
                    weights[i] / free_total
                } else {
                    1.0 / free.len() as f64
                };
                weights[i] += residual * share;
            }
        }

        if !converged {
            for w in weights.iter_mut() {
                *w = w.clamp(min_w, max_w);
            }
            let residual = 1.0 - weights.iter().sum::<f64>();
            warn!(
                residual,
                max_iterations = self.config.max_iterations,
                "weight allocation did not converge, rounding correction absorbs residual"
            );
        }

        let factor = 10f64.powi(self.config.precision as i32);
        let mut rounded: Vec<f64> = weights.iter().map(|w| (w * factor).round() / factor).collect();

        // Largest weight, first symbol on ties
        let largest = rounded
            .iter()
            .enumerate()
            .fold(0, |best, (i, w)| if *w > rounded[best] { i } else { best });
        let others: f64 = rounded
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != largest)
            .map(|(_, w)| w)
            .sum();
        rounded[largest] = ((1.0 - others) * factor).round() / factor;

        let allocation: BTreeMap<String, f64> = symbols
            .into_iter()
            .cloned()
            .zip(rounded)
            .collect();

        TargetAllocation::try_new(allocation)
    }
}
