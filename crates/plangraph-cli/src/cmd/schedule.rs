//! `plangraph schedule`: critical-path schedule with lanes.

use std::io::Write;

use clap::Args;
use plangraph_core::PlanConfig;
use plangraph_plan::{Schedule, compute_schedule};

use super::{PlanArgs, load_plan, open_graph};
use crate::output::{OutputMode, kv, render, section};

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub plan: PlanArgs,
}

pub fn run_schedule(
    args: &ScheduleArgs,
    output: OutputMode,
    config: &PlanConfig,
) -> anyhow::Result<()> {
    let plan = load_plan(&args.plan.file, output)?;
    let engine = open_graph(&plan, config);
    let schedule = compute_schedule(&engine, &plan.estimate_set(), &config.schedule);

    render(output, &schedule, render_schedule_human)
}

fn render_schedule_human(schedule: &Schedule, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, "Schedule")?;
    writeln!(
        w,
        "{:<16} {:>6} {:>6} {:>4} {:>6}",
        "issue", "start", "end", "row", "slack"
    )?;
    for task in &schedule.tasks {
        writeln!(
            w,
            "{:<16} {:>6} {:>6} {:>4} {:>6}{}",
            task.id,
            task.start_day,
            task.end_day,
            task.row,
            task.slack,
            if task.is_on_critical_path { "  *" } else { "" }
        )?;
    }

    writeln!(w)?;
    let totals = &schedule.totals;
    kv(
        w,
        "days",
        format!(
            "{} expected ({} to {})",
            totals.expected_days, totals.min_days, totals.max_days
        ),
    )?;
    kv(w, "critical path", schedule.critical_path.join(" → "))?;

    if let Some(check) = schedule.critical_path_check.as_ref().filter(|c| !c.agrees) {
        writeln!(w, "⚠ asserted critical path disagrees with the computed one")?;
        if !check.missing.is_empty() {
            kv(w, "  missing", check.missing.join(", "))?;
        }
        if !check.unexpected.is_empty() {
            kv(w, "  unexpected", check.unexpected.join(", "))?;
        }
    }
    Ok(())
}
