//! `plangraph importance`: rank issues by how much open work they block.


use clap::Args;
use plangraph_core::PlanConfig;
use plangraph_plan::BlockerImportance;
use plangraph_plan::importance::IssueScore;
use serde::Serialize;

use super::{PlanArgs, load_plan, open_graph};
use crate::output::{OutputMode, render, section};

#[derive(Args, Debug)]
pub struct ImportanceArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Show only the top N issues.
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ImportanceOutput {
    policy: plangraph_core::config::ImportancePolicy,
    scores: Vec<IssueScore>,
}

pub fn run_importance(
    args: &ImportanceArgs,
    output: OutputMode,
    config: &PlanConfig,
) -> anyhow::Result<()> {
    let plan = load_plan(&args.plan.file, output)?;
    let engine = open_graph(&plan, config);
    let importance = BlockerImportance::new(&engine, config.importance.policy);

    let mut scores = importance.scores().to_vec();
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(limit) = args.limit {
        scores.truncate(limit);
    }

    let payload = ImportanceOutput {
        policy: importance.policy(),
        scores,
    };
    render(output, &payload, |p, w| {
        section(w, "Blocker importance")?;
        for entry in &p.scores {
            let title = engine.issue(&entry.id).map_or("", |i| i.title.as_str());
            writeln!(w, "{:>5.1}%  {:<16} {title}", entry.score * 100.0, entry.id)?;
        }
        Ok(())
    })
}
