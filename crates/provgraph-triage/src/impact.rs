//! Cascading-failure ("knock-down") analysis.
//!
//! If a node fails, every execution consuming it fails too, and so do the
//! consumers of their outputs. The knocked-down set of a node is therefore
//! everything forward-reachable from it, plus the node itself.
//!
//! Traversal is breadth-first with a FIFO frontier, so
//! [`KnockDown::knocked`] lists nodes in the order the failure reaches them.

use std::collections::{HashSet, VecDeque};

use provgraph_core::{GraphError, ProvGraph, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Nodes taken down by the failure of `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnockDown {
    pub start: String,
    /// Knocked nodes in discovery order, `start` first.
    pub knocked: Vec<String>,
}

impl KnockDown {
    /// Number of knocked nodes, including `start`.
    #[must_use]
    pub fn count(&self) -> usize {
        self.knocked.len()
    }
}

/// The candidate whose failure knocks down the most nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostKnocked {
    pub node: String,
    pub count: usize,
}

/// Forward-reachable set of `start`, including `start` itself.
///
/// # Errors
///
/// - [`GraphError::EmptyGraph`] if the graph has no nodes.
/// - [`GraphError::NodeNotFound`] if `start` is absent.
pub fn knocked_down(graph: &ProvGraph, start: &str) -> Result<KnockDown> {
    if graph.is_empty() {
        return Err(GraphError::EmptyGraph);
    }
    if !graph.contains_node(start) {
        return Err(GraphError::NodeNotFound {
            key: start.to_string(),
        });
    }

    let mut frontier: VecDeque<&str> = VecDeque::from([start]);
    let mut seen: HashSet<&str> = HashSet::from([start]);
    let mut knocked: Vec<String> = vec![start.to_string()];

    while let Some(current) = frontier.pop_front() {
        for next in graph.successors(current) {
            if seen.insert(next) {
                frontier.push_back(next);
                knocked.push(next.to_string());
            }
        }
    }

    Ok(KnockDown {
        start: start.to_string(),
        knocked,
    })
}

/// Run [`knocked_down`] for each candidate and keep the largest.
///
/// Candidates are evaluated in the given order (repeats are skipped) and the
/// maximum is taken with a strict `>`, so the first candidate reaching the
/// top count wins. Returns `Ok(None)` when `candidates` is empty.
///
/// # Errors
///
/// - [`GraphError::EmptyGraph`] if the graph has no nodes.
/// - [`GraphError::NodeNotFound`] if a candidate is absent.
#[instrument(skip(graph, candidates), fields(nodes = graph.node_count()))]
pub fn most_knocked_down<S: AsRef<str>>(
    graph: &ProvGraph,
    candidates: &[S],
) -> Result<Option<MostKnocked>> {
    if graph.is_empty() {
        return Err(GraphError::EmptyGraph);
    }

    let mut rates: Vec<(&str, usize)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = candidate.as_ref();
        if rates.iter().any(|(seen, _)| *seen == key) {
            continue;
        }
        let count = knocked_down(graph, key)?.count();
        rates.push((key, count));
    }
    debug!(candidates = rates.len(), "knock-down rates computed");

    let mut best: Option<MostKnocked> = None;
    let mut max = 0;
    for (key, count) in rates {
        if count > max {
            max = count;
            best = Some(MostKnocked {
                node: key.to_string(),
                count,
            });
        }
    }
    Ok(best)
}

/// [`most_knocked_down`] over every data artifact of the graph.
///
/// # Errors
///
/// Returns [`GraphError::EmptyGraph`] if the graph has no nodes.
pub fn most_knocked_down_data(graph: &ProvGraph) -> Result<Option<MostKnocked>> {
    let data = graph.data_nodes();
    most_knocked_down(graph, &data)
}

/// Knock down `start` and permanently remove the knocked set from `graph`.
///
/// Models a failure that is never repaired; intended for a single
/// diagnostic run, not for candidate sweeps.
///
/// # Errors
///
/// Same as [`knocked_down`].
#[instrument(skip(graph))]
pub fn knock_down_and_remove(graph: &mut ProvGraph, start: &str) -> Result<KnockDown> {
    let result = knocked_down(graph, start)?;
    info!(knocked = result.count(), node = start, "knocked down");
    for key in &result.knocked {
        graph.remove_node(key)?;
    }
    info!(remaining = ?graph.nodes(), "remaining nodes");
    Ok(result)
}
