//! Collapse repeated executions of one software into a single node.
//!
//! # Overview
//!
//! A provenance graph usually records every run of a tool as its own
//! execution node (`bwa.0.1`, `bwa.0.2`, …). For structural analysis it is
//! often more useful to see "bwa, any version" as one node. Merging works in
//! two layers:
//!
//! 1. [`merge`] fuses two nodes: the survivor takes the first node's key and
//!    inherits the union of both nodes' neighbors.
//! 2. [`merge_software_families`] groups software keys by their family prefix
//!    (see [`family`]), folds every group into its first member, then
//!    canonicalizes each remaining software key to `prefix.`.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::error::{GraphError, Result};
use crate::model::{ProvGraph, SEPARATOR, family};

/// Separator used for the transient combined key during a merge.
const COMBINED_SEPARATOR: char = '/';

/// Which keys were folded into each software family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// `(canonical key, original member keys)` in family order.
    pub families: Vec<(String, Vec<String>)>,
}

impl MergeReport {
    /// Number of execution nodes removed by merging.
    #[must_use]
    pub fn absorbed(&self) -> usize {
        self.families
            .iter()
            .map(|(_, members)| members.len().saturating_sub(1))
            .sum()
    }
}

/// Merge `n2` into `n1`.
///
/// The union of both nodes' predecessors (and successors), minus the two
/// nodes themselves, is wired to a fresh combined node that is appended to
/// the node order. Both originals are removed and the combined node is
/// relabeled back to `n1`, carrying `n1`'s attributes.
///
/// # Errors
///
/// - [`GraphError::NodeNotFound`] if either node is absent.
/// - [`GraphError::InvalidMerge`] if `n1 == n2`.
pub fn merge(mut graph: ProvGraph, n1: &str, n2: &str) -> Result<ProvGraph> {
    for key in [n1, n2] {
        if !graph.contains_node(key) {
            return Err(GraphError::node_not_found(key));
        }
    }
    if n1 == n2 {
        return Err(GraphError::InvalidMerge {
            key: n1.to_string(),
        });
    }

    let predecessors = union_excluding(
        graph.predecessors(n1),
        graph.predecessors(n2),
        [n1, n2],
    );
    let successors = union_excluding(graph.successors(n1), graph.successors(n2), [n1, n2]);

    let combined = format!("{n1}{COMBINED_SEPARATOR}{n2}");
    match graph.weight(n1) {
        Some(weight) => graph.add_weighted_node(&combined, weight),
        None => {
            graph.add_node(&combined);
        }
    }
    for pred in &predecessors {
        graph.add_edge(pred, &combined);
    }
    for succ in &successors {
        graph.add_edge(&combined, succ);
    }

    graph.remove_node(n1)?;
    graph.remove_node(n2)?;
    graph.relabel(&combined, n1)?;

    debug!(
        n1,
        n2,
        predecessors = predecessors.len(),
        successors = successors.len(),
        "merged nodes"
    );
    Ok(graph)
}

fn union_excluding(first: Vec<&str>, second: Vec<&str>, exclude: [&str; 2]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for key in first.into_iter().chain(second) {
        if exclude.contains(&key) || out.iter().any(|seen| seen == key) {
            continue;
        }
        out.push(key.to_string());
    }
    out
}

/// Group software nodes by family prefix, preserving first-appearance order.
#[must_use]
pub fn software_families(graph: &ProvGraph) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for key in graph.software_nodes() {
        let prefix = family(key).to_string();
        let slot = *position.entry(prefix.clone()).or_insert_with(|| {
            groups.push((prefix, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(key.to_string());
    }
    groups
}

/// Canonical key for a software family: `prefix` followed by the separator.
#[must_use]
pub fn canonical_key(key: &str) -> String {
    format!("{}{SEPARATOR}", family(key))
}

/// Collapse every software family into one node keyed `prefix.`.
///
/// Each family with more than one member is merged pairwise into its first
/// member (`merge(g0, g1)`, then `merge(g0, g2)`, …). Single-member families
/// are left in place. Finally every software key is canonicalized.
///
/// # Errors
///
/// Propagates errors from [`merge`]; none are expected for a well-formed
/// graph since every member is taken from the graph itself.
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn merge_software_families(mut graph: ProvGraph) -> Result<(ProvGraph, MergeReport)> {
    let groups = software_families(&graph);
    let mut report = MergeReport::default();

    for (prefix, members) in groups {
        if let Some((head, rest)) = members.split_first() {
            for member in rest {
                graph = merge(graph, head, member)?;
            }
        }
        report.families.push((format!("{prefix}{SEPARATOR}"), members));
    }

    let software: Vec<String> = graph
        .software_nodes()
        .into_iter()
        .map(str::to_string)
        .collect();
    for key in software {
        let canonical = canonical_key(&key);
        graph.relabel(&key, &canonical)?;
    }

    info!(
        families = report.families.len(),
        absorbed = report.absorbed(),
        nodes = graph.node_count(),
        "merged software families"
    );
    Ok((graph, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_neighbors_and_keeps_first_key() {
        let g = ProvGraph::from_edges(&[("a", "x.1"), ("x.1", "b"), ("c", "x.2"), ("x.2", "d")]);
        let merged = merge(g, "x.1", "x.2").expect("merge");

        assert_eq!(merged.node_count(), 5);
        assert!(merged.contains_node("x.1"));
        assert!(!merged.contains_node("x.2"));
        assert_eq!(merged.predecessors("x.1"), vec!["a", "c"]);
        assert_eq!(merged.successors("x.1"), vec!["b", "d"]);
    }

    #[test]
    fn merge_moves_survivor_to_end_of_order() {
        let g = ProvGraph::from_edges(&[("x.1", "a"), ("x.2", "b")]);
        let merged = merge(g, "x.1", "x.2").expect("merge");
        assert_eq!(merged.nodes(), vec!["a", "b", "x.1"]);
    }

    #[test]
    fn merge_drops_edges_between_the_pair() {
        let g = ProvGraph::from_edges(&[("x.1", "x.2"), ("x.2", "x.1"), ("x.2", "out")]);
        let merged = merge(g, "x.1", "x.2").expect("merge");
        assert!(!merged.contains_edge("x.1", "x.1"));
        assert_eq!(merged.edges(), vec![("x.1", "out")]);
    }

    #[test]
    fn merge_keeps_first_nodes_weight() {
        let mut g = ProvGraph::from_edges(&[("x.1", "a"), ("x.2", "a")]);
        g.set_weight("x.1", 3.0).expect("weight");
        g.set_weight("x.2", 7.0).expect("weight");
        let merged = merge(g, "x.1", "x.2").expect("merge");
        assert_eq!(merged.weight("x.1"), Some(3.0));
    }

    #[test]
    fn merge_missing_node_fails() {
        let g = ProvGraph::from_edges(&[("x.1", "a")]);
        assert_eq!(
            merge(g, "x.1", "nope").unwrap_err(),
            GraphError::NodeNotFound { key: "nope".into() }
        );
    }

    #[test]
    fn merge_with_self_is_rejected() {
        let g = ProvGraph::from_edges(&[("x.1", "a")]);
        assert!(matches!(
            merge(g, "x.1", "x.1"),
            Err(GraphError::InvalidMerge { .. })
        ));
    }

    #[test]
    fn families_group_by_prefix_in_order() {
        let g = ProvGraph::from_edges(&[("b.1", "d"), ("a.1", "d"), ("b.2", "e"), ("d", "a.2")]);
        let families = software_families(&g);
        assert_eq!(
            families,
            vec![
                ("b".to_string(), vec!["b.1".to_string(), "b.2".to_string()]),
                ("a".to_string(), vec!["a.1".to_string(), "a.2".to_string()]),
            ]
        );
    }

    #[test]
    fn singleton_family_is_only_canonicalized() {
        let g = ProvGraph::from_edges(&[("in", "solo.3.1"), ("solo.3.1", "out")]);
        let (merged, report) = merge_software_families(g).expect("merge");
        assert_eq!(merged.nodes(), vec!["in", "solo.", "out"]);
        assert_eq!(report.absorbed(), 0);
    }
}
