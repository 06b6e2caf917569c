//! `plangraph layout`: layered drawing coordinates.

use std::io::Write;

use clap::Args;
use plangraph_core::PlanConfig;
use plangraph_plan::{Layout, compute_layout};
use serde::Serialize;

use super::{PlanArgs, load_plan, open_graph};
use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    #[serde(flatten)]
    layout: Layout,
    edges: Vec<(String, String)>,
}

pub fn run_layout(
    args: &LayoutArgs,
    output: OutputMode,
    config: &PlanConfig,
) -> anyhow::Result<()> {
    let plan = load_plan(&args.plan.file, output)?;
    let engine = open_graph(&plan, config);
    let layout = compute_layout(&engine, &config.layout);
    let edges = layout
        .edges(&engine)
        .into_iter()
        .map(|(d, p)| (d.to_string(), p.to_string()))
        .collect();

    render(output, &LayoutOutput { layout, edges }, render_layout_human)
}

fn render_layout_human(payload: &LayoutOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let layout = &payload.layout;
    section(w, "Layout")?;
    kv(w, "canvas", format!("{:.0} x {:.0}", layout.width, layout.height))?;
    for (index, layer) in layout.layers().iter().enumerate() {
        writeln!(w, "  layer {index}: {}", layer.join(", "))?;
    }
    Ok(())
}
