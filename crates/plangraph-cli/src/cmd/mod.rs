pub mod health;
pub mod importance;
pub mod layout;
pub mod link;
pub mod ready;
pub mod repair;
pub mod schedule;

use std::path::{Path, PathBuf};

use clap::Args;
use plangraph_core::{ErrorCode, GraphEngine, GraphError, PlanConfig};
use tracing::warn;

use crate::output::{CliError, OutputMode, render_error};
use crate::plan_file::PlanFile;

/// Plan file selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Path to the JSON plan file.
    #[arg(short, long, value_name = "PATH", default_value = "plan.json")]
    pub file: PathBuf,
}

/// Load the plan file, reporting `E1003` on failure.
pub fn load_plan(path: &Path, output: OutputMode) -> anyhow::Result<PlanFile> {
    match PlanFile::load(path) {
        Ok(plan) => Ok(plan),
        Err(err) => {
            render_error(
                output,
                &CliError::from_code(ErrorCode::PlanFileInvalid, format!("{err:#}")),
            )?;
            Err(err)
        }
    }
}

/// Build the engine for `plan`, logging the soft size warning if it applies.
pub fn open_graph(plan: &PlanFile, config: &PlanConfig) -> GraphEngine {
    let duplicates = plan.duplicate_ids();
    if !duplicates.is_empty() {
        warn!(?duplicates, "plan repeats issue ids; only the last of each is used");
    }
    let engine = plan.engine();
    if let Some(message) = engine.size_warning(config.graph.warn_node_count) {
        warn!("{message}");
    }
    engine
}

/// Report a rejected mutation and turn it into the command's error.
pub fn fail_mutation(output: OutputMode, err: GraphError) -> anyhow::Result<()> {
    render_error(output, &CliError::from_code(err.code(), err.to_string()))?;
    Err(err.into())
}

/// Write the engine's state back to `path`.
///
/// Refuses (`E1004`) when the plan repeats an id, since saving would drop
/// every copy but the last.
pub fn save_plan(
    plan: &mut PlanFile,
    engine: &GraphEngine,
    path: &Path,
    output: OutputMode,
) -> anyhow::Result<()> {
    let duplicates = plan.duplicate_ids();
    if !duplicates.is_empty() {
        let message = format!(
            "refusing to rewrite {}: duplicate issue ids {}",
            path.display(),
            duplicates.join(", ")
        );
        render_error(output, &CliError::from_code(ErrorCode::DuplicateIssueId, &message))?;
        anyhow::bail!(message);
    }
    plan.update_from(engine);
    plan.save(path)
}
