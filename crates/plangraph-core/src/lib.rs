#![forbid(unsafe_code)]
//! plangraph-core library.
//!
//! Issue model, the guarded dependency graph ([`GraphEngine`]), cycle guard,
//! graph validation and engine configuration.
//!
//! # Conventions
//!
//! - **Errors**: [`GraphError`] for mutation failures; `anyhow::Result` for
//!   I/O-facing helpers such as config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod model;

pub use config::PlanConfig;
pub use error::{ConfigError, ErrorCode, GraphError};
pub use graph::{GraphEngine, HealthReport};
pub use model::{DurationEstimate, Issue, Priority, Status};
