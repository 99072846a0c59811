//! Read-only analytics: `pagerank`, `knocked-down`, `most-knocked-down`,
//! `jump-one-step-behind`, `order`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use provgraph_core::order::execution_order;
use provgraph_triage::metrics::pagerank::software_ranking;
use provgraph_triage::{
    AncestorKeying, ancestor_weight, knock_down_and_remove, knocked_down, most_important,
    most_knocked_down_data, pagerank,
};
use serde_json::json;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::document::read_graph;
use crate::output::{OutputMode, emit};

/// Arguments shared by commands that only read a graph.
#[derive(Args, Debug)]
pub struct GraphArg {
    /// Graph document (JSON).
    pub graph: PathBuf,
}

#[derive(Args, Debug)]
pub struct KnockedArgs {
    /// Graph document (JSON).
    pub graph: PathBuf,
    /// Node whose failure is simulated.
    pub node: String,
    /// Remove the knocked-down nodes and report what remains.
    #[arg(long)]
    pub remove: bool,
}

#[derive(Args, Debug)]
pub struct JumpArgs {
    /// Graph document (JSON).
    pub graph: PathBuf,
    /// Target node.
    pub node: String,
    /// Key sums by direct predecessor instead of the last grandparent.
    #[arg(long)]
    pub by_predecessor: bool,
}

pub fn run_pagerank(args: &GraphArg, config: &AnalysisConfig, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let result = pagerank(&graph, &config.pagerank).context("pagerank")?;
    let top = most_important(&result).context("pagerank produced no scores")?;
    let software = software_ranking(&result);

    let value = json!({
        "node": top.node,
        "score": top.score,
        "iterations": result.iterations,
        "converged": result.converged,
        "software": software
            .iter()
            .map(|(key, score)| json!({"node": key, "score": score}))
            .collect::<Vec<_>>(),
    });
    emit(mode, &value, |w| {
        writeln!(w, "PageRank results of each software execution:")?;
        for (key, score) in &software {
            writeln!(w, "{key} => {score}")?;
        }
        writeln!(w, "* pr {} => {}", top.node, top.score)
    })
}

pub fn run_knocked_down(args: &KnockedArgs, mode: OutputMode) -> Result<()> {
    let mut graph = read_graph(&args.graph)?;
    let result = if args.remove {
        knock_down_and_remove(&mut graph, &args.node)
    } else {
        knocked_down(&graph, &args.node)
    };
    let result = result.with_context(|| format!("knock down {}", args.node))?;

    let remaining: Vec<&str> = if args.remove { graph.nodes() } else { Vec::new() };
    let value = json!({
        "node": result.start,
        "count": result.count(),
        "knocked": result.knocked,
        "remaining": remaining,
    });
    emit(mode, &value, |w| {
        writeln!(w, "* knocked_node_size={} for node={}", result.count(), result.start)?;
        writeln!(w, "knocked: {}", result.knocked.join(", "))?;
        if args.remove {
            writeln!(w, "remaining: {}", remaining.join(", "))?;
        }
        Ok(())
    })
}

pub fn run_most_knocked_down(args: &GraphArg, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let best = most_knocked_down_data(&graph).context("most knocked down")?;
    match best {
        Some(best) => {
            let value = json!({"node": best.node, "count": best.count});
            emit(mode, &value, |w| {
                writeln!(w, "* node={} ; most_knocked_len={}", best.node, best.count)
            })
        }
        None => {
            info!("graph has no data nodes");
            emit(mode, &json!(null), |w| writeln!(w, "no data nodes"))
        }
    }
}

pub fn run_jump(args: &JumpArgs, config: &AnalysisConfig, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let keying = if args.by_predecessor {
        AncestorKeying::Predecessor
    } else {
        config.ancestry.keying
    };
    let sums = ancestor_weight(&graph, &args.node, keying)
        .with_context(|| format!("ancestor weight of {}", args.node))?;

    let value = json!(
        sums.iter()
            .map(|(key, sum)| json!({"node": key, "sum": sum}))
            .collect::<Vec<_>>()
    );
    emit(mode, &value, |w| {
        writeln!(w, "Nodes from smallest sum of input to greatest:")?;
        for (key, sum) in &sums {
            writeln!(w, "{key} => {sum}")?;
        }
        Ok(())
    })
}

pub fn run_order(args: &GraphArg, mode: OutputMode) -> Result<()> {
    let graph = read_graph(&args.graph)?;
    let order = execution_order(&graph);
    let value = serde_json::to_value(&order).context("serialize execution order")?;
    emit(mode, &value, |w| {
        writeln!(
            w,
            "List of software in execution order and their initial generated data files:"
        )?;
        for entry in &order {
            let marker = if entry.unordered { " (unordered)" } else { "" };
            writeln!(w, "{}{marker}: {}", entry.software, entry.generated.join(", "))?;
        }
        Ok(())
    })
}
