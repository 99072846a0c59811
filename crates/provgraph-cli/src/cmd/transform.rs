//! Graph transforms: `merge` and `dagify`.
//!
//! Both write the transformed graph document to `--output` (or stdout) and
//! log a summary; in JSON mode with `--output`, the summary is printed as
//! JSON instead.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use provgraph_core::cycles::dagify;
use provgraph_core::merge::merge_software_families;
use serde_json::json;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::document::{read_graph, write_graph};
use crate::output::{OutputMode, emit};

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Graph document (JSON).
    pub graph: PathBuf,
    /// Where to write the transformed graph (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run_merge(args: &TransformArgs, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let (merged, report) = merge_software_families(graph).context("merge software families")?;
    info!(
        families = report.families.len(),
        absorbed = report.absorbed(),
        "merged executions of the same software"
    );

    write_graph(&merged, args.output.as_deref())?;
    if args.output.is_some() {
        let families: Vec<_> = report
            .families
            .iter()
            .map(|(key, members)| json!({"node": key, "members": members}))
            .collect();
        emit(mode, &json!({ "families": families }), |w| {
            for (key, members) in &report.families {
                writeln!(w, "{key} <- {}", members.join(", "))?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

pub fn run_dagify(args: &TransformArgs, config: &AnalysisConfig, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let outcome = dagify(graph, &config.dagify).context("dagify")?;
    for (from, to) in &outcome.removed {
        info!("removed {from} -> {to}");
    }

    write_graph(&outcome.graph, args.output.as_deref())?;
    if args.output.is_some() {
        let value = json!({
            "iterations": outcome.iterations,
            "removed": outcome.removed,
        });
        emit(mode, &value, |w| {
            for (from, to) in &outcome.removed {
                writeln!(w, "removed {from} -> {to}")?;
            }
            Ok(())
        })?;
    }
    Ok(())
}
