#![forbid(unsafe_code)]
//! plangraph-plan library.
//!
//! Full-recompute passes over a [`plangraph_core::GraphEngine`]:
//!
//! - [`layout`]: layered (Sugiyama-style) drawing coordinates.
//! - [`schedule`]: critical-path scheduling with lane packing.
//! - [`importance`]: how much open work each issue blocks.
//!
//! Every pass takes the graph by shared reference and returns an owned,
//! immutable result. None of them can fail.
//!
//! # Conventions
//!
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod importance;
pub mod layout;
pub mod schedule;

pub use importance::BlockerImportance;
pub use layout::{Layout, NodePosition, compute_layout};
pub use schedule::{
    CriticalPathCheck, EstimateSet, PlanTotals, Schedule, ScheduledTask, compute_schedule,
};
