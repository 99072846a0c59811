//! Two-hop ancestor weight ("jump one step behind").
//!
//! For a target node, every direct predecessor `p` is examined and the
//! `weight` attributes of `p`'s own predecessors (the target's two-hop
//! ancestors through `p`) are summed.
//!
//! How each sum is keyed is selected with [`AncestorKeying`]:
//!
//! - [`AncestorKeying::LastGrandparent`] keys the sum by the last
//!   grandparent visited for that `p`. Several predecessors whose ancestor
//!   lists end on the same node share one slot, and the later sum replaces
//!   the earlier one. A predecessor without ancestors contributes nothing.
//!   This is the default.
//! - [`AncestorKeying::Predecessor`] keys the sum by `p` itself, so every
//!   predecessor appears exactly once (with 0.0 if it has no ancestors).
//!
//! Legacy "jump one step behind" reports were keyed by the direct
//! predecessor whenever that predecessor had ancestors, so for those entries
//! they match [`AncestorKeying::Predecessor`]. They diverge only for a
//! predecessor without ancestors, whose 0.0 was written under the key left
//! over from the previous predecessor. Neither mode reproduces that.
//!
//! Both modes sort the output ascending by sum; equal sums keep the
//! order in which their keys were first recorded.

use provgraph_core::{GraphError, ProvGraph, Result};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// How ancestor sums are keyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorKeying {
    /// Key by the last grandparent visited for each predecessor.
    #[default]
    LastGrandparent,
    /// Key by the direct predecessor.
    Predecessor,
}

/// Sum two-hop ancestor weights of `target`.
///
/// # Errors
///
/// - [`GraphError::NodeNotFound`] if `target` is absent.
/// - [`GraphError::MissingWeight`] if a visited grandparent has no weight.
#[instrument(skip(graph))]
pub fn ancestor_weight(
    graph: &ProvGraph,
    target: &str,
    keying: AncestorKeying,
) -> Result<Vec<(String, f64)>> {
    if !graph.contains_node(target) {
        return Err(GraphError::NodeNotFound {
            key: target.to_string(),
        });
    }

    let mut track: Vec<(String, f64)> = Vec::new();
    for parent in graph.predecessors(target) {
        let mut sum = 0.0;
        let mut last: Option<&str> = None;
        for grandparent in graph.predecessors(parent) {
            sum += graph
                .weight(grandparent)
                .ok_or_else(|| GraphError::MissingWeight {
                    key: grandparent.to_string(),
                })?;
            last = Some(grandparent);
        }

        let key = match keying {
            AncestorKeying::LastGrandparent => last,
            AncestorKeying::Predecessor => Some(parent),
        };
        if let Some(key) = key {
            upsert(&mut track, key, sum);
        }
    }

    track.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(track)
}

fn upsert(track: &mut Vec<(String, f64)>, key: &str, sum: f64) {
    match track.iter_mut().find(|(existing, _)| existing == key) {
        Some(slot) => slot.1 = sum,
        None => track.push((key.to_string(), sum)),
    }
}
