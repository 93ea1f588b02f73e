//! Trade execution trait.

use crate::error::ExecutionError;
use crate::types::{Fill, TradeAction};
use async_trait::async_trait;

/// Trait for order execution collaborators (simulated or real).
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Execute one trade action.
    async fn execute(&mut self, action: &TradeAction) -> Result<Fill, ExecutionError>;

    /// Get the executor name.
    fn name(&self) -> &str;
}
