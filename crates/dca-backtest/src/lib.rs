//! Backtesting of recurring investment with threshold rebalancing.

mod engine;
mod report;
mod statistics;

pub use engine::{BacktestConfig, DcaSimulator};
pub use report::BacktestReport;
pub use statistics::BacktestStats;
