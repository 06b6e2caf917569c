//! `plangraph link` / `plangraph unlink`: guarded edge edits.


use clap::Args;
use plangraph_core::PlanConfig;
use serde::Serialize;
use tracing::info;

use super::{PlanArgs, fail_mutation, load_plan, open_graph, save_plan};
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Issue that has to wait.
    pub dependent: String,

    /// Issue that must finish first.
    pub prerequisite: String,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Debug, Serialize)]
struct LinkOutput<'a> {
    dependent: &'a str,
    prerequisite: &'a str,
    changed: bool,
}

pub fn run_link(args: &LinkArgs, output: OutputMode, config: &PlanConfig) -> anyhow::Result<()> {
    let mut plan = load_plan(&args.plan.file, output)?;
    let mut engine = open_graph(&plan, config);

    let existed = engine
        .dependencies(&args.dependent)
        .contains(&args.prerequisite);
    if let Err(err) = engine.add_dependency(&args.dependent, &args.prerequisite) {
        return fail_mutation(output, err);
    }

    if !existed {
        save_plan(&mut plan, &engine, &args.plan.file, output)?;
        info!(dependent = %args.dependent, prerequisite = %args.prerequisite, "dependency added");
    }

    let payload = LinkOutput {
        dependent: &args.dependent,
        prerequisite: &args.prerequisite,
        changed: !existed,
    };
    render(output, &payload, |p, w| {
        if p.changed {
            writeln!(w, "✓ {} now depends on {}", p.dependent, p.prerequisite)
        } else {
            writeln!(w, "{} already depends on {}", p.dependent, p.prerequisite)
        }
    })
}

pub fn run_unlink(args: &LinkArgs, output: OutputMode, config: &PlanConfig) -> anyhow::Result<()> {
    let mut plan = load_plan(&args.plan.file, output)?;
    let mut engine = open_graph(&plan, config);

    let removed = engine.remove_dependency(&args.dependent, &args.prerequisite);
    if removed {
        save_plan(&mut plan, &engine, &args.plan.file, output)?;
        info!(dependent = %args.dependent, prerequisite = %args.prerequisite, "dependency removed");
    }

    let payload = LinkOutput {
        dependent: &args.dependent,
        prerequisite: &args.prerequisite,
        changed: removed,
    };
    render(output, &payload, |p, w| {
        if p.changed {
            writeln!(w, "✓ {} no longer depends on {}", p.dependent, p.prerequisite)
        } else {
            writeln!(w, "{} did not depend on {}", p.dependent, p.prerequisite)
        }
    })
}
