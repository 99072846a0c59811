//! PageRank importance scores for provenance nodes.
//!
//! # Overview
//!
//! PageRank identifies nodes that a large share of the data flow passes
//! through. High-ranked artifacts are consumed by many executions whose
//! outputs are themselves widely consumed.
//!
//! # Algorithm
//!
//! Standard power iteration on the directed graph:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//! ```
//!
//! where `d` is the damping factor (default 0.9). Dangling nodes (no
//! out-edges) spread their rank uniformly over every node, so the scores
//! always sum to 1. Each iteration reads the previous score buffer and
//! writes the next one.
//!
//! # Picking the winner
//!
//! [`most_important`] sorts scores ascending (stable, so equal scores keep
//! graph order) and scans them with a strict `>` against a running maximum.
//! Among several nodes sharing the top score the first one in graph order
//! wins.

use std::collections::HashMap;

use provgraph_core::{GraphError, NodeKind, ProvGraph, Result, classify};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Default: 0.9.
    pub damping: f64,
    /// Convergence threshold: stop when the L1 norm of the rank delta drops
    /// below `tolerance * N`. Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations. Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.9,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// `(node key, score)` in graph order.
    pub scores: Vec<(String, f64)>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
}

impl PageRankResult {
    /// Score of a single node.
    #[must_use]
    pub fn score(&self, key: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|(node, _)| node == key)
            .map(|(_, score)| *score)
    }

    /// Scores sorted ascending; equal scores keep graph order.
    #[must_use]
    pub fn ascending(&self) -> Vec<(&str, f64)> {
        let mut sorted: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(key, score)| (key.as_str(), *score))
            .collect();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
        sorted
    }
}

/// The most important node and its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked {
    pub node: String,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

/// Compute PageRank for every node of `graph`.
///
/// # Errors
///
/// Returns [`GraphError::EmptyGraph`] if the graph has no nodes.
#[instrument(skip(graph, config), fields(nodes = graph.node_count()))]
pub fn pagerank(graph: &ProvGraph, config: &PageRankConfig) -> Result<PageRankResult> {
    let keys = graph.nodes();
    let n = keys.len();
    if n == 0 {
        return Err(GraphError::EmptyGraph);
    }

    let position: HashMap<&str, usize> = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();
    let targets: Vec<Vec<usize>> = keys
        .iter()
        .map(|key| graph.successors(key).iter().map(|s| position[s]).collect())
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        let dangling: f64 = targets
            .iter()
            .zip(&ranks)
            .filter(|(out, _)| out.is_empty())
            .map(|(_, rank)| rank)
            .sum();
        let teleport = config.damping.mul_add(dangling / n_f64, base);
        for r in &mut new_ranks {
            *r = teleport;
        }

        for (idx, out) in targets.iter().enumerate() {
            if out.is_empty() {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let share = config.damping * ranks[idx] / out.len() as f64;
            for &next in out {
                new_ranks[next] += share;
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(&new_ranks)
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance * n_f64 {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(iterations, "pagerank converged");
    } else {
        warn!(iterations, "pagerank did not converge within max_iter");
    }

    let scores = keys
        .into_iter()
        .map(str::to_string)
        .zip(ranks)
        .collect();

    Ok(PageRankResult {
        scores,
        iterations,
        converged,
    })
}

/// Pick the most important node: ascending stable sort, strict `>` scan.
///
/// Returns `None` only for an empty result.
#[must_use]
pub fn most_important(result: &PageRankResult) -> Option<Ranked> {
    let mut best: Option<&str> = None;
    let mut max = 0.0_f64;
    for (key, score) in result.ascending() {
        if score > max {
            max = score;
            best = Some(key);
        }
    }
    best.map(|node| Ranked {
        node: node.to_string(),
        score: max,
    })
}

/// Software-execution scores in ascending order.
#[must_use]
pub fn software_ranking(result: &PageRankResult) -> Vec<(&str, f64)> {
    result
        .ascending()
        .into_iter()
        .filter(|(key, _)| classify(key) == NodeKind::Software)
        .collect()
}

/// Run PageRank and return the most important node.
///
/// # Errors
///
/// Returns [`GraphError::EmptyGraph`] if the graph has no nodes.
pub fn rank(graph: &ProvGraph, config: &PageRankConfig) -> Result<Ranked> {
    let result = pagerank(graph, config)?;
    most_important(&result).ok_or(GraphError::EmptyGraph)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn total(result: &PageRankResult) -> f64 {
        result.scores.iter().map(|(_, s)| s).sum()
    }

    #[test]
    fn empty_graph_is_an_error() {
        let g = ProvGraph::new();
        assert_eq!(
            pagerank(&g, &PageRankConfig::default()).unwrap_err(),
            GraphError::EmptyGraph
        );
        assert_eq!(
            rank(&g, &PageRankConfig::default()).unwrap_err(),
            GraphError::EmptyGraph
        );
    }

    #[test]
    fn single_node_gets_everything() {
        let mut g = ProvGraph::new();
        g.add_node("only");
        let result = pagerank(&g, &PageRankConfig::default()).expect("pagerank");
        assert!((result.score("only").expect("score") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn chain_sink_ranks_highest() {
        let g = ProvGraph::from_edges(&[("a", "b"), ("b", "c")]);
        let result = pagerank(&g, &PageRankConfig::default()).expect("pagerank");
        assert!(result.converged);
        assert!((total(&result) - 1.0).abs() < 1e-9);
        let a = result.score("a").expect("a");
        let b = result.score("b").expect("b");
        let c = result.score("c").expect("c");
        assert!(a < b && b < c, "a={a} b={b} c={c}");
        assert_eq!(most_important(&result).expect("winner").node, "c");
    }

    #[test]
    fn symmetric_cycle_ties_go_to_first_node() {
        let g = ProvGraph::from_edges(&[("x", "y"), ("y", "z"), ("z", "x")]);
        let result = pagerank(&g, &PageRankConfig::default()).expect("pagerank");
        let winner = most_important(&result).expect("winner");
        assert_eq!(winner.node, "x");
        assert!((winner.score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn equal_scores_keep_graph_order_in_scan() {
        let result = PageRankResult {
            scores: vec![
                ("late".into(), 0.4),
                ("low".into(), 0.2),
                ("tie".into(), 0.4),
            ],
            iterations: 1,
            converged: true,
        };
        assert_eq!(
            most_important(&result),
            Some(Ranked {
                node: "late".into(),
                score: 0.4
            })
        );
    }

    #[test]
    fn software_ranking_filters_executions() {
        let g = ProvGraph::from_edges(&[("in", "tool.1.0"), ("tool.1.0", "out")]);
        let result = pagerank(&g, &PageRankConfig::default()).expect("pagerank");
        let ranking = software_ranking(&result);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].0, "tool.1.0");
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let g = ProvGraph::from_edges(&[("a", "b"), ("b", "c"), ("c", "a"), ("a", "c")]);
        let config = PageRankConfig {
            max_iter: 1,
            tolerance: 0.0,
            ..PageRankConfig::default()
        };
        let result = pagerank(&g, &config).expect("pagerank");
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert!((total(&result) - 1.0).abs() < 1e-9);
    }
}
