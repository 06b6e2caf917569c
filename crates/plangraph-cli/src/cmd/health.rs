//! `plangraph health`: cycles, dangling edges and redundant edges.

use std::io::Write;

use clap::Args;
use plangraph_core::graph::{HealthReport, health};
use plangraph_core::PlanConfig;
use serde::Serialize;

use super::{PlanArgs, load_plan, open_graph};
use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct HealthArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Debug, Serialize)]
struct HealthOutput {
    issues: usize,
    edges: usize,
    content_hash: String,
    #[serde(flatten)]
    report: HealthReport,
}

pub fn run_health(
    args: &HealthArgs,
    output: OutputMode,
    config: &PlanConfig,
) -> anyhow::Result<()> {
    let plan = load_plan(&args.plan.file, output)?;
    let engine = open_graph(&plan, config);

    let payload = HealthOutput {
        issues: engine.len(),
        edges: engine.edge_count(),
        content_hash: engine.content_hash(),
        report: health(&engine),
    };

    render(output, &payload, render_health_human)
}

fn render_health_human(payload: &HealthOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;
    section(w, "Graph health")?;
    kv(w, "issues", payload.issues.to_string())?;
    kv(w, "edges", payload.edges.to_string())?;
    kv(
        w,
        "status",
        if report.is_healthy {
            "✓ healthy".to_string()
        } else {
            format!("⚠ {} finding(s)", report.issue_count())
        },
    )?;

    if !report.cycles.is_empty() {
        writeln!(w)?;
        section(w, "Cycles")?;
        for cycle in &report.cycles {
            writeln!(w, "  {cycle}")?;
        }
    }
    if !report.invalid_edges.is_empty() {
        writeln!(w)?;
        section(w, "Invalid edges")?;
        for edge in &report.invalid_edges {
            writeln!(w, "  {} → {} (missing)", edge.dependent, edge.missing)?;
        }
    }
    if !report.redundant_edges.is_empty() {
        writeln!(w)?;
        section(w, "Redundant edges")?;
        for edge in &report.redundant_edges {
            writeln!(
                w,
                "  {} → {} (implied through {})",
                edge.dependent, edge.prerequisite, edge.through
            )?;
        }
    }
    Ok(())
}
