//! The dependency graph and everything that keeps it valid.
//!
//! ## Submodules
//!
//! - [`engine`] — [`GraphEngine`], the owning issue graph with guarded edge
//!   mutation and reachability queries.
//! - [`cycles`] — cycle guard used by `add_dependency`, plus reporting of
//!   cycles that already exist in imported data.
//! - [`validate`] — invalid and redundant edge detection, explicit repairs
//!   and the aggregate [`HealthReport`].
//!
//! Edge direction throughout is `dependent → prerequisite`.

pub mod cycles;
pub mod engine;
pub mod validate;

pub use cycles::{CycleReport, find_all_cycles, would_create_cycle};
pub use engine::GraphEngine;
pub use validate::{
    HealthReport, InvalidEdge, RedundantEdge, find_cycles, find_invalid_edges,
    find_redundant_edges, health, remove_invalid_edges, remove_redundant_edges,
};
