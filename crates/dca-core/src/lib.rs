//! Core types and traits for the DCA portfolio engine.
//!
//! This crate provides the foundational building blocks including:
//! - Price history types (PricePoint, PriceSeries)
//! - Derived per-asset metrics and scored assets
//! - Target allocations, portfolio snapshots and trade actions
//! - Rebalance decisions
//! - Collaborator traits for history providers, snapshot providers and executors

pub mod types;
pub mod traits;
pub mod error;

pub use error::{DcaError, DcaResult};
pub use types::*;
pub use traits::*;
