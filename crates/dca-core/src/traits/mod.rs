//! Collaborator traits at the edges of the engine.

mod executor;
mod history;

pub use executor::TradeExecutor;
pub use history::{HistorySource, SnapshotSource};
