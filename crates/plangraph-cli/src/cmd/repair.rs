//! `plangraph repair`: drop dangling and/or redundant edges.


use clap::Args;
use plangraph_core::PlanConfig;
use plangraph_core::graph::{remove_invalid_edges, remove_redundant_edges};
use serde::Serialize;
use tracing::info;

use super::{PlanArgs, load_plan, open_graph, save_plan};
use crate::output::{OutputMode, kv, render};

/// With neither `--invalid` nor `--redundant`, both repairs run.
#[derive(Args, Debug)]
pub struct RepairArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Remove edges that point at unknown issues.
    #[arg(long)]
    pub invalid: bool,

    /// Remove edges already implied by a longer path.
    #[arg(long)]
    pub redundant: bool,

    /// Save the repaired plan. Without it, only report what would change.
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Serialize)]
struct RepairOutput {
    invalid_removed: usize,
    redundant_removed: usize,
    written: bool,
    content_hash: String,
}

pub fn run_repair(
    args: &RepairArgs,
    output: OutputMode,
    config: &PlanConfig,
) -> anyhow::Result<()> {
    let mut plan = load_plan(&args.plan.file, output)?;
    let mut engine = open_graph(&plan, config);
    let both = !args.invalid && !args.redundant;

    // Dangling edges go first so the reduction only sees known issues.
    let invalid_removed = if both || args.invalid {
        remove_invalid_edges(&mut engine)
    } else {
        0
    };
    let redundant_removed = if both || args.redundant {
        remove_redundant_edges(&mut engine)
    } else {
        0
    };

    let changed = invalid_removed + redundant_removed > 0;
    let written = args.write && changed;
    if written {
        save_plan(&mut plan, &engine, &args.plan.file, output)?;
        info!(path = %args.plan.file.display(), "plan file rewritten");
    }

    let payload = RepairOutput {
        invalid_removed,
        redundant_removed,
        written,
        content_hash: engine.content_hash(),
    };

    render(output, &payload, |p, w| {
        kv(w, "invalid", p.invalid_removed.to_string())?;
        kv(w, "redundant", p.redundant_removed.to_string())?;
        if p.written {
            writeln!(w, "✓ plan updated")
        } else if p.invalid_removed + p.redundant_removed > 0 {
            writeln!(w, "dry run: pass --write to save")
        } else {
            writeln!(w, "✓ nothing to repair")
        }
    })
}
