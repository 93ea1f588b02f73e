//! Per-asset metrics and return correlation.
//!
//! This crate turns raw price histories into the statistics the selector ranks on:
//! - Daily simple returns (SIMD-accelerated)
//! - Volatility, Sharpe, Sortino, momentum, drawdown and liquidity per asset
//! - Pairwise Pearson correlation over overlapping history
//! - Risk statistics of a weighted allocation
//!
//! Everything here is a pure function of its input.

pub mod correlation;
pub mod engine;
pub mod portfolio_stats;
pub mod returns;
pub mod simd;
pub mod stats;

pub use correlation::{CorrelationConfig, CorrelationMatrix};
pub use engine::{MetricsConfig, MetricsEngine};
pub use portfolio_stats::PortfolioStats;
pub use returns::{simple_returns, timestamped_returns};
