//! Rebalancing a held portfolio back toward its target.
//!
//! Provides:
//! - The rebalance monitor (deviation triggers with interval guards)
//! - The trade planner (deadband, sizing and priorities)
//! - Execution bookkeeping and a paper executor

mod execution;
mod monitor;
mod paper;
mod planner;

pub use execution::{
    execute_plan, ExecutionStatus, RebalanceExecution, RebalancePlan, MAX_EXECUTABLE_PRIORITY,
};
pub use monitor::{RebalanceConfig, RebalanceMonitor};
pub use paper::PaperExecutor;
pub use planner::{PlannerConfig, TradePlanner};
