//! Portfolio construction for recurring crypto investment.
//!
//! Turns per-asset metrics into a target allocation:
//! - Multi-factor scoring with min-max normalization
//! - Greedy correlation-capped selection with minimum-basket backfill
//! - Bounded score-proportional weights
//! - Named configuration presets
//! - Splitting a recurring contribution across the target

mod allocator;
mod contribution;
mod optimizer;
mod presets;
mod scoring;
mod selector;

pub use allocator::{AllocatorConfig, WeightAllocator};
pub use contribution::ContributionPlan;
pub use optimizer::{OptimizationConfig, OptimizationOutcome, PortfolioOptimizer};
pub use presets::{PresetInfo, PresetRegistry, DEFAULT_PRESET};
pub use scoring::{score_assets, FactorWeights};
pub use selector::{AssetSelector, Selection, SelectorConfig};
