//! Rebalance plans and execution records.

use chrono::{DateTime, Utc};
use dca_core::traits::TradeExecutor;
use dca_core::types::{Fill, PortfolioState, RebalanceDecision, Side, TradeAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Actions with a priority above this are not submitted.
pub const MAX_EXECUTABLE_PRIORITY: u8 = 3;

/// Lifecycle of a rebalance execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Planned,
    Executed,
    Failed,
}

impl ExecutionStatus {
    /// Check if the execution has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Executed | ExecutionStatus::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Planned => write!(f, "planned"),
            ExecutionStatus::Executed => write!(f, "executed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Trades planned for one rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlan {
    pub portfolio_id: String,
    pub created_at: DateTime<Utc>,
    /// Reason reported by the monitor
    pub reason: String,
    /// Actions in priority order
    pub actions: Vec<TradeAction>,
    pub total_deviation: f64,
}

impl RebalancePlan {
    pub fn new(
        portfolio_id: impl Into<String>,
        decision: &RebalanceDecision,
        actions: Vec<TradeAction>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            portfolio_id: portfolio_id.into(),
            created_at,
            reason: decision.reason.clone(),
            actions,
            total_deviation: decision.total_deviation,
        }
    }

    /// Actions that will be submitted, sells ahead of buys so proceeds fund purchases.
    pub fn executable(&self) -> Vec<&TradeAction> {
        let mut actions: Vec<&TradeAction> = self
            .actions
            .iter()
            .filter(|a| a.is_within_priority(MAX_EXECUTABLE_PRIORITY))
            .collect();
        actions.sort_by_key(|a| (a.side == Side::Buy, a.priority));
        actions
    }

    /// Actions left for the caller to execute or skip.
    pub fn deferred(&self) -> Vec<&TradeAction> {
        self.actions
            .iter()
            .filter(|a| !a.is_within_priority(MAX_EXECUTABLE_PRIORITY))
            .collect()
    }

    /// Total notional of the executable actions.
    pub fn executable_notional(&self) -> Decimal {
        self.executable().iter().map(|a| a.notional).sum()
    }
}

/// Record of one rebalance attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceExecution {
    pub id: Uuid,
    pub plan: RebalancePlan,
    pub status: ExecutionStatus,
    pub notes: Vec<String>,
    /// Fills for actions that went through, in submission order
    pub fills: Vec<Fill>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl RebalanceExecution {
    /// Create a record for a plan that has not been executed yet.
    pub fn planned(plan: RebalancePlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan,
            status: ExecutionStatus::Planned,
            notes: Vec::new(),
            fills: Vec::new(),
            executed_at: None,
        }
    }

    /// Fees paid across all fills.
    pub fn total_fees(&self) -> Decimal {
        self.fills.iter().map(|f| f.fee).sum()
    }
}

/// Submit a plan's executable actions.
///
/// Execution stops at the first failure and the record is marked failed; fills already
/// made are kept. On success `state.last_rebalance` is advanced to `now`. A plan with no
/// executable actions is recorded as executed without advancing the state.
pub async fn execute_plan<E>(
    executor: &mut E,
    plan: RebalancePlan,
    state: &mut PortfolioState,
    now: DateTime<Utc>,
) -> RebalanceExecution
where
    E: TradeExecutor + ?Sized,
{
    let mut execution = RebalanceExecution::planned(plan);

    let deferred = execution.plan.deferred().len();
    if deferred > 0 {
        execution.notes.push(format!(
            "{} action(s) below minimum notional deferred",
            deferred
        ));
    }

    let actions: Vec<TradeAction> = execution.plan.executable().into_iter().cloned().collect();

    if actions.is_empty() {
        execution.notes.push("no executable actions".to_string());
        execution.status = ExecutionStatus::Executed;
        execution.executed_at = Some(now);
        return execution;
    }

    for action in &actions {
        match executor.execute(action).await {
            Ok(fill) => {
                info!(
                    symbol = %fill.symbol,
                    side = %fill.side,
                    notional = %fill.notional,
                    price = %fill.price,
                    "rebalance trade filled"
                );
                execution.fills.push(fill);
            }
            Err(err) => {
                warn!(
                    symbol = %action.symbol,
                    executor = executor.name(),
                    error = %err,
                    "rebalance trade failed"
                );
                execution
                    .notes
                    .push(format!("{} {} failed: {}", action.side, action.symbol, err));
                execution.status = ExecutionStatus::Failed;
                execution.executed_at = Some(now);
                return execution;
            }
        }
    }

    execution.status = ExecutionStatus::Executed;
    execution.executed_at = Some(now);
    state.mark_rebalanced(now);

    info!(
        id = %execution.id,
        portfolio = %state.portfolio_id,
        trades = execution.fills.len(),
        "rebalance executed"
    );

    execution
}
