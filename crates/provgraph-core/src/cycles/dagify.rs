//! Turn a cyclic provenance graph into a DAG ("dagify").
//!
//! # State machine
//!
//! ```text
//!            ┌──────── remove one edge ────────┐
//!            ▼                                 │
//!   enumerate cycles ── cycles found ──▶ Cyclic
//!            │
//!            └── none ──▶ Acyclic (terminal)
//! ```
//!
//! Each `Cyclic` step scores edges by how many elementary cycles they sit
//! on, counting only edges whose source is a software execution:
//!
//! - If some edge sits on more than one cycle, the highest-scoring edge is
//!   removed (first found wins ties).
//! - Otherwise every candidate edge sits on exactly one cycle. The source
//!   with the largest current out-degree is picked, and its outgoing edge
//!   inside the most recently enumerated cycle that contains it is removed.
//!
//! When no software execution lies on any cycle, every node is treated as an
//! eligible edge source so pure data cycles still resolve.
//!
//! Every step removes exactly one edge, so the edge count strictly
//! decreases and the elementary-cycle count never grows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::elementary::{Cycle, elementary_cycles};
use crate::error::{GraphError, Result};
use crate::model::{NodeKind, ProvGraph, classify};

/// Configuration for [`dagify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagifyConfig {
    /// Maximum number of edge removals. `None` uses the graph's edge count,
    /// which is always enough since each step removes one edge.
    pub max_iterations: Option<usize>,
    /// Maximum number of elementary cycles enumerated per step.
    /// Default: 10 000.
    pub max_cycles: usize,
}

impl Default for DagifyConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            max_cycles: 10_000,
        }
    }
}

/// Where the resolver stands after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverState {
    /// Cycles remain; `removed` is the edge taken out in this step.
    Cyclic { cycles: usize, removed: (String, String) },
    /// No elementary cycles remain.
    Acyclic,
}

/// Result of a completed [`dagify`] run.
#[derive(Debug, Clone)]
pub struct DagifyOutcome {
    /// The acyclic graph.
    pub graph: ProvGraph,
    /// Removed edges in removal order.
    pub removed: Vec<(String, String)>,
    /// Number of edge-removal steps performed.
    pub iterations: usize,
}

/// Iterative cycle breaker over an owned graph.
#[derive(Debug)]
pub struct CycleResolver {
    graph: ProvGraph,
    config: DagifyConfig,
    removed: Vec<(String, String)>,
}

impl CycleResolver {
    /// Take ownership of `graph` for resolution.
    #[must_use]
    pub const fn new(graph: ProvGraph, config: DagifyConfig) -> Self {
        Self {
            graph,
            config,
            removed: Vec::new(),
        }
    }

    /// The graph in its current (possibly still cyclic) state.
    #[must_use]
    pub const fn graph(&self) -> &ProvGraph {
        &self.graph
    }

    /// Edges removed so far.
    #[must_use]
    pub fn removed(&self) -> &[(String, String)] {
        &self.removed
    }

    /// Run one step: enumerate cycles and, if any exist, remove one edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleBudgetExceeded`] if enumeration exceeds
    /// the configured budget.
    pub fn step(&mut self) -> Result<ResolverState> {
        let cycles = elementary_cycles(&self.graph, self.config.max_cycles)?;
        if cycles.is_empty() {
            return Ok(ResolverState::Acyclic);
        }

        let (from, to) = select_edge(&self.graph, &cycles);
        debug!(%from, %to, cycles = cycles.len(), "removing edge");
        self.graph.remove_edge(&from, &to)?;
        self.removed.push((from.clone(), to.clone()));

        Ok(ResolverState::Cyclic {
            cycles: cycles.len(),
            removed: (from, to),
        })
    }

    /// Step until acyclic.
    ///
    /// # Errors
    ///
    /// - [`GraphError::CycleResolutionFailed`] if the iteration cap is hit
    ///   while cycles remain.
    /// - [`GraphError::CycleBudgetExceeded`] from enumeration.
    pub fn run(mut self) -> Result<DagifyOutcome> {
        let cap = self
            .config
            .max_iterations
            .unwrap_or_else(|| self.graph.edge_count());
        let mut iterations = 0;

        loop {
            if iterations >= cap {
                let remaining = elementary_cycles(&self.graph, self.config.max_cycles)?;
                if remaining.is_empty() {
                    break;
                }
                return Err(GraphError::CycleResolutionFailed {
                    iterations,
                    remaining_cycles: remaining.len(),
                });
            }
            match self.step()? {
                ResolverState::Acyclic => break,
                ResolverState::Cyclic { .. } => iterations += 1,
            }
        }

        Ok(DagifyOutcome {
            graph: self.graph,
            removed: self.removed,
            iterations,
        })
    }
}

/// Remove edges from `graph` until it has no elementary cycles.
///
/// # Errors
///
/// See [`CycleResolver::run`].
#[instrument(skip(graph, config), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn dagify(graph: ProvGraph, config: &DagifyConfig) -> Result<DagifyOutcome> {
    let outcome = CycleResolver::new(graph, config.clone()).run()?;
    info!(
        removed = outcome.removed.len(),
        iterations = outcome.iterations,
        "graph is acyclic"
    );
    Ok(outcome)
}

/// Hit counters keyed by ordered edge, kept in first-hit order.
#[derive(Debug, Default)]
struct EdgeHits {
    order: Vec<((String, String), usize)>,
    slot: HashMap<(String, String), usize>,
}

impl EdgeHits {
    fn hit(&mut self, from: &str, to: &str) {
        let key = (from.to_string(), to.to_string());
        let next = self.order.len();
        let slot = *self.slot.entry(key.clone()).or_insert(next);
        if slot == next {
            self.order.push((key, 0));
        }
        self.order[slot].1 += 1;
    }

    /// Strict `>` scan from zero: the first edge reaching the maximum wins.
    fn max(&self) -> Option<(&(String, String), usize)> {
        let mut best: Option<(&(String, String), usize)> = None;
        let mut best_hits = 0;
        for (edge, hits) in &self.order {
            if *hits > best_hits {
                best_hits = *hits;
                best = Some((edge, *hits));
            }
        }
        best
    }
}

fn count_hits(cycles: &[Cycle], eligible: impl Fn(&str) -> bool) -> EdgeHits {
    let mut hits = EdgeHits::default();
    for cycle in cycles {
        for (i, from) in cycle.iter().enumerate() {
            if !eligible(from) {
                continue;
            }
            let to = &cycle[(i + 1) % cycle.len()];
            hits.hit(from, to);
        }
    }
    hits
}

fn select_edge(graph: &ProvGraph, cycles: &[Cycle]) -> (String, String) {
    let mut hits = count_hits(cycles, |key| classify(key) == NodeKind::Software);
    if hits.order.is_empty() {
        hits = count_hits(cycles, |_| true);
    }

    match hits.max() {
        Some((edge, count)) if count > 1 => edge.clone(),
        _ => busiest_source_edge(graph, cycles, &hits),
    }
}

/// Every candidate edge sits on one cycle: pick the hit source with the
/// largest out-degree and cut its edge inside the latest cycle holding it.
fn busiest_source_edge(graph: &ProvGraph, cycles: &[Cycle], hits: &EdgeHits) -> (String, String) {
    let mut sources: Vec<(&str, usize)> = Vec::new();
    for ((from, _), _) in &hits.order {
        if sources.iter().all(|(seen, _)| *seen != from.as_str()) {
            sources.push((from.as_str(), graph.out_degree(from)));
        }
    }
    // Stable: equal degrees keep first-hit order.
    sources.sort_by(|a, b| b.1.cmp(&a.1));

    let source = sources.first().map_or_else(String::new, |(key, _)| (*key).to_string());
    for cycle in cycles.iter().rev() {
        if let Some(pos) = cycle.iter().position(|key| *key == source) {
            let to = cycle[(pos + 1) % cycle.len()].clone();
            return (source, to);
        }
    }
    // Unreachable for a non-empty hit table: every source came from a cycle.
    (source.clone(), source)
}
