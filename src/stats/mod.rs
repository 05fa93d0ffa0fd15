//! Statistics aggregation engine.
//!
//! Turns the full fight corpus into one career metrics snapshot per fighter.
//! Aggregation is synchronous and recomputes everything on each run.

pub mod metrics;
pub mod totals;

pub use metrics::{aggregate, FighterMetrics};
