//! `plangraph ready`: what can start now, and what is still waiting.


use clap::Args;
use plangraph_core::PlanConfig;
use plangraph_core::model::{Issue, Priority};
use serde::Serialize;

use super::{PlanArgs, load_plan, open_graph};
use crate::output::{OutputMode, render, section};

#[derive(Args, Debug)]
pub struct ReadyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Debug, Serialize)]
struct ReadyIssue {
    id: String,
    title: String,
    priority: Priority,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    waiting_on: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReadyOutput {
    ready: Vec<ReadyIssue>,
    blocked: Vec<ReadyIssue>,
}

pub fn run_ready(args: &ReadyArgs, output: OutputMode, config: &PlanConfig) -> anyhow::Result<()> {
    let plan = load_plan(&args.plan.file, output)?;
    let engine = open_graph(&plan, config);

    let entry = |issue: &Issue| ReadyIssue {
        id: issue.id.clone(),
        title: issue.title.clone(),
        priority: issue.priority,
        waiting_on: issue
            .dependencies
            .iter()
            .filter(|p| engine.issue(p).is_none_or(Issue::is_open))
            .cloned()
            .collect(),
    };

    let mut ready: Vec<ReadyIssue> = engine.ready_issues().into_iter().map(entry).collect();
    ready.sort_by_key(|r| r.priority);
    let blocked: Vec<ReadyIssue> = engine.blocked_issues().into_iter().map(entry).collect();

    render(output, &ReadyOutput { ready, blocked }, |p, w| {
        section(w, "Ready")?;
        if p.ready.is_empty() {
            writeln!(w, "  (nothing ready)")?;
        }
        for issue in &p.ready {
            writeln!(w, "  {} {:<16} {}", issue.priority, issue.id, issue.title)?;
        }
        if !p.blocked.is_empty() {
            writeln!(w)?;
            section(w, "Blocked")?;
            for issue in &p.blocked {
                writeln!(
                    w,
                    "  {:<16} waiting on {}",
                    issue.id,
                    issue.waiting_on.join(", ")
                )?;
            }
        }
        Ok(())
    })
}
