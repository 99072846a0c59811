#![forbid(unsafe_code)]

mod cmd;
mod config;
mod document;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "provg: provenance graph analytics",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ./provgraph.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Collapse executions of the same software into one node")]
    Merge(cmd::transform::TransformArgs),

    #[command(about = "Rank nodes by PageRank and report the most important")]
    Pagerank(cmd::analyze::GraphArg),

    #[command(about = "List every node lost if the given node fails")]
    KnockedDown(cmd::analyze::KnockedArgs),

    #[command(about = "Find the data node whose failure knocks down the most nodes")]
    MostKnockedDown(cmd::analyze::GraphArg),

    #[command(about = "Sum input weights two hops behind a node")]
    JumpOneStepBehind(cmd::analyze::JumpArgs),

    #[command(about = "Remove edges until the graph has no cycles")]
    Dagify(cmd::transform::TransformArgs),

    #[command(about = "List software in execution order with the data each generated")]
    Order(cmd::analyze::GraphArg),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PROVGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "provg=debug,info"
        } else {
            "provg=info,warn"
        })
    });

    let format = env::var("PROVGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

fn run(cli: &Cli, mode: OutputMode) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let config = config::load_config(cli.config.as_deref(), &cwd)?;
    debug!(?mode, "starting");

    match &cli.command {
        Commands::Merge(args) => cmd::transform::run_merge(args, mode),
        Commands::Pagerank(args) => cmd::analyze::run_pagerank(args, &config, mode),
        Commands::KnockedDown(args) => cmd::analyze::run_knocked_down(args, mode),
        Commands::MostKnockedDown(args) => cmd::analyze::run_most_knocked_down(args, mode),
        Commands::JumpOneStepBehind(args) => cmd::analyze::run_jump(args, &config, mode),
        Commands::Dagify(args) => cmd::transform::run_dagify(args, &config, mode),
        Commands::Order(args) => cmd::analyze::run_order(args, mode),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mode = OutputMode::from_flag(cli.json);

    match run(&cli, mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(mode, &CliError::from_anyhow(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
