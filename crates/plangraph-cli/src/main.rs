#![forbid(unsafe_code)]

mod cmd;
mod output;
mod plan_file;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use plangraph_core::{ConfigError, ErrorCode};
use plangraph_core::config::resolve_config;
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "plangraph: dependency graph planning (cycle-safe DAG, layout, critical path)",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        OutputMode::from_json_flag(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Report cycles, dangling edges and redundant edges",
        after_help = "EXAMPLES:\n    # Check the plan in the current directory\n    plangraph health\n\n    # Emit machine-readable output\n    plangraph health --file plan.json --json"
    )]
    Health(cmd::health::HealthArgs),

    #[command(
        about = "Remove dangling and/or redundant edges",
        after_help = "EXAMPLES:\n    # Preview every repair\n    plangraph repair\n\n    # Drop redundant edges and save\n    plangraph repair --redundant --write"
    )]
    Repair(cmd::repair::RepairArgs),

    #[command(
        about = "Make DEPENDENT wait for PREREQUISITE",
        after_help = "EXAMPLES:\n    # B cannot start before A is closed\n    plangraph link B A"
    )]
    Link(cmd::link::LinkArgs),

    #[command(
        about = "Remove a dependency edge",
        after_help = "EXAMPLES:\n    plangraph unlink B A"
    )]
    Unlink(cmd::link::LinkArgs),

    #[command(about = "Compute layered drawing coordinates")]
    Layout(cmd::layout::LayoutArgs),

    #[command(
        about = "Schedule open work and find the critical path",
        after_help = "EXAMPLES:\n    plangraph schedule --file plan.json\n    plangraph schedule --json"
    )]
    Schedule(cmd::schedule::ScheduleArgs),

    #[command(about = "Rank issues by how much open work they block")]
    Importance(cmd::importance::ImportanceArgs),

    #[command(about = "List issues that can start now and those still waiting")]
    Ready(cmd::ready::ReadyArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PLANGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "plangraph=debug,info"
        } else {
            "plangraph=info,warn"
        })
    });

    let format = env::var("PLANGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    let config = match resolve_config(cli.config.as_deref(), &project_root) {
        Ok(config) => config,
        Err(err) => {
            let code = err
                .downcast_ref::<ConfigError>()
                .map_or(ErrorCode::ConfigParseError, ConfigError::code);
            render_error(output, &CliError::from_code(code, format!("{err:#}")))?;
            return Err(err);
        }
    };
    debug!(?config, "configuration resolved");

    match cli.command {
        Commands::Health(ref args) => cmd::health::run_health(args, output, &config),
        Commands::Repair(ref args) => cmd::repair::run_repair(args, output, &config),
        Commands::Link(ref args) => cmd::link::run_link(args, output, &config),
        Commands::Unlink(ref args) => cmd::link::run_unlink(args, output, &config),
        Commands::Layout(ref args) => cmd::layout::run_layout(args, output, &config),
        Commands::Schedule(ref args) => cmd::schedule::run_schedule(args, output, &config),
        Commands::Importance(ref args) => cmd::importance::run_importance(args, output, &config),
        Commands::Ready(ref args) => cmd::ready::run_ready(args, output, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["plangraph", "health"],
            vec!["plangraph", "repair", "--redundant", "--write"],
            vec!["plangraph", "link", "B", "A"],
            vec!["plangraph", "unlink", "B", "A", "--file", "p.json"],
            vec!["plangraph", "layout"],
            vec!["plangraph", "schedule", "-f", "p.json"],
            vec!["plangraph", "importance", "-n", "3"],
            vec!["plangraph", "ready"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["plangraph", "health", "--json", "--config", "c.toml"]);
        assert_eq!(cli.output_mode(), OutputMode::Json);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn file_defaults_to_plan_json() {
        let cli = Cli::parse_from(["plangraph", "ready"]);
        match cli.command {
            Commands::Ready(args) => assert_eq!(args.plan.file, PathBuf::from("plan.json")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
