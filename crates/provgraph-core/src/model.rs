//! In-memory provenance graph.
//!
//! # Overview
//!
//! A provenance graph records software executions and the data artifacts
//! they consume and produce. Every node is identified by a string key and is
//! classified by that key alone:
//!
//! - keys containing [`SEPARATOR`] (`name.version.index`) are
//!   [`NodeKind::Software`] executions,
//! - every other key is a [`NodeKind::Data`] artifact.
//!
//! An edge `A → B` is a data-flow relation: artifact consumed by an
//! execution, or artifact produced by one.
//!
//! ## Iteration order
//!
//! Node iteration follows insertion order, and neighbor iteration follows
//! edge insertion order. Several analytics break ties by "first in iteration
//! order", so this order is part of the contract: nodes created by a
//! transform are appended at the end and [`ProvGraph::relabel`] keeps a
//! node's position.
//!
//! Storage is a [`StableDiGraph`] so indices survive node removal; each node
//! and edge carries a monotonically increasing sequence number that fixes the
//! iteration order independently of petgraph's slot reuse.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Reserved character separating the fields of a software-execution key.
pub const SEPARATOR: char = '.';

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// One execution instance of a software version.
    Software,
    /// A data artifact.
    Data,
}

/// Classify a node key. Keys without a separator default to [`NodeKind::Data`].
#[must_use]
pub fn classify(key: &str) -> NodeKind {
    if key.contains(SEPARATOR) {
        NodeKind::Software
    } else {
        NodeKind::Data
    }
}

/// Software-family prefix: the portion of `key` before the first separator.
///
/// Data keys have no separator and are their own family.
#[must_use]
pub fn family(key: &str) -> &str {
    key.split_once(SEPARATOR).map_or(key, |(prefix, _)| prefix)
}

#[derive(Debug, Clone)]
struct NodeData {
    key: String,
    weight: Option<f64>,
    seq: u64,
}

/// Directed provenance graph with string-keyed nodes.
#[derive(Debug, Clone, Default)]
pub struct ProvGraph {
    graph: StableDiGraph<NodeData, u64>,
    index: HashMap<String, NodeIndex>,
    next_seq: u64,
}

impl ProvGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list, creating endpoints on first mention.
    #[must_use]
    pub fn from_edges<S: AsRef<str>>(edges: &[(S, S)]) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from.as_ref(), to.as_ref());
        }
        graph
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn idx(&self, key: &str) -> Result<NodeIndex> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::node_not_found(key))
    }

    fn key_of(&self, idx: NodeIndex) -> &str {
        self.graph
            .node_weight(idx)
            .map_or("", |node| node.key.as_str())
    }

    fn ensure_node(&mut self, key: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(key) {
            return *idx;
        }
        let seq = self.bump();
        let idx = self.graph.add_node(NodeData {
            key: key.to_string(),
            weight: None,
            seq,
        });
        self.index.insert(key.to_string(), idx);
        idx
    }

    /// Add a node. Returns `false` if the key was already present.
    pub fn add_node(&mut self, key: &str) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        self.ensure_node(key);
        true
    }

    /// Add a node (or update an existing one) with a `weight` attribute.
    pub fn add_weighted_node(&mut self, key: &str, weight: f64) {
        let idx = self.ensure_node(key);
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.weight = Some(weight);
        }
    }

    /// Set the `weight` attribute of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `key` is absent.
    pub fn set_weight(&mut self, key: &str, weight: f64) -> Result<()> {
        let idx = self.idx(key)?;
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.weight = Some(weight);
        }
        Ok(())
    }

    /// The `weight` attribute of `key`, if the node exists and has one.
    #[must_use]
    pub fn weight(&self, key: &str) -> Option<f64> {
        let idx = self.index.get(key)?;
        self.graph.node_weight(*idx)?.weight
    }

    /// Add the edge `from → to`, creating missing endpoints.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        if self.graph.find_edge(a, b).is_some() {
            return false;
        }
        let seq = self.bump();
        self.graph.add_edge(a, b, seq);
        true
    }

    /// Remove the edge `from → to`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] for a missing endpoint and
    /// [`GraphError::EdgeNotFound`] if the edge does not exist.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<()> {
        let a = self.idx(from)?;
        let b = self.idx(to)?;
        let edge = self
            .graph
            .find_edge(a, b)
            .ok_or_else(|| GraphError::EdgeNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        self.graph.remove_edge(edge);
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `key` is absent.
    pub fn remove_node(&mut self, key: &str) -> Result<()> {
        let idx = self.idx(key)?;
        self.graph.remove_node(idx);
        self.index.remove(key);
        Ok(())
    }

    /// Rename `old` to `new`, keeping its position, attributes and edges.
    ///
    /// If `new` already names another node, the two are folded together: the
    /// existing `new` node keeps its position and receives `old`'s edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] if `old` is absent.
    pub fn relabel(&mut self, old: &str, new: &str) -> Result<()> {
        let idx = self.idx(old)?;
        if old == new {
            return Ok(());
        }
        if self.index.contains_key(new) {
            let outgoing: Vec<String> = self
                .successors(old)
                .into_iter()
                .map(map_self(old, new))
                .collect();
            let incoming: Vec<String> = self
                .predecessors(old)
                .into_iter()
                .map(map_self(old, new))
                .collect();
            self.remove_node(old)?;
            for succ in &outgoing {
                self.add_edge(new, succ);
            }
            for pred in &incoming {
                self.add_edge(pred, new);
            }
            return Ok(());
        }
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.key = new.to_string();
        }
        self.index.remove(old);
        self.index.insert(new.to_string(), idx);
        Ok(())
    }

    /// Whether `key` names a node.
    #[must_use]
    pub fn contains_node(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Whether the edge `from → to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b).is_some(),
            _ => false,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All node keys in iteration order.
    #[must_use]
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&NodeData> = self
            .graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect();
        nodes.sort_by_key(|node| node.seq);
        nodes.into_iter().map(|node| node.key.as_str()).collect()
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(u64, NodeIndex, NodeIndex)> = self
            .graph
            .edge_references()
            .map(|edge| (*edge.weight(), edge.source(), edge.target()))
            .collect();
        edges.sort_by_key(|(seq, _, _)| *seq);
        edges
            .into_iter()
            .map(|(_, a, b)| (self.key_of(a), self.key_of(b)))
            .collect()
    }

    fn neighbors(&self, key: &str, direction: Direction) -> Vec<&str> {
        let Some(idx) = self.index.get(key) else {
            return Vec::new();
        };
        let mut found: Vec<(u64, NodeIndex)> = self
            .graph
            .edges_directed(*idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (*edge.weight(), other)
            })
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, other)| self.key_of(other)).collect()
    }

    /// Direct successors of `key` in edge insertion order (empty if absent).
    #[must_use]
    pub fn successors(&self, key: &str) -> Vec<&str> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Direct predecessors of `key` in edge insertion order (empty if absent).
    #[must_use]
    pub fn predecessors(&self, key: &str) -> Vec<&str> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Outgoing edges of `key` as `(key, successor)` pairs.
    #[must_use]
    pub fn out_edges<'a>(&'a self, key: &'a str) -> Vec<(&'a str, &'a str)> {
        self.successors(key).into_iter().map(|succ| (key, succ)).collect()
    }

    /// Incoming edges of `key` as `(predecessor, key)` pairs.
    #[must_use]
    pub fn in_edges<'a>(&'a self, key: &'a str) -> Vec<(&'a str, &'a str)> {
        self.predecessors(key).into_iter().map(|pred| (pred, key)).collect()
    }

    #[must_use]
    pub fn out_degree(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |idx| {
            self.graph.edges_directed(*idx, Direction::Outgoing).count()
        })
    }

    #[must_use]
    pub fn in_degree(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |idx| {
            self.graph.edges_directed(*idx, Direction::Incoming).count()
        })
    }

    /// Software-execution nodes in iteration order.
    #[must_use]
    pub fn software_nodes(&self) -> Vec<&str> {
        self.nodes()
            .into_iter()
            .filter(|key| classify(key) == NodeKind::Software)
            .collect()
    }

    /// Data-artifact nodes in iteration order.
    #[must_use]
    pub fn data_nodes(&self) -> Vec<&str> {
        self.nodes()
            .into_iter()
            .filter(|key| classify(key) == NodeKind::Data)
            .collect()
    }
}

fn map_self<'a>(old: &'a str, new: &'a str) -> impl Fn(&str) -> String + 'a {
    move |key| {
        if key == old {
            new.to_string()
        } else {
            key.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_uses_separator() {
        assert_eq!(classify("bwa.0.7"), NodeKind::Software);
        assert_eq!(classify("sw."), NodeKind::Software);
        assert_eq!(classify("42"), NodeKind::Data);
        assert_eq!(classify(""), NodeKind::Data);
    }

    #[test]
    fn family_is_prefix_before_first_separator() {
        assert_eq!(family("bwa.0.7"), "bwa");
        assert_eq!(family("sw."), "sw");
        assert_eq!(family("reads"), "reads");
    }

    #[test]
    fn add_edge_creates_endpoints_and_dedups() {
        let mut g = ProvGraph::new();
        assert!(g.add_edge("a", "b"));
        assert!(!g.add_edge("a", "b"));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.contains_edge("a", "b"));
        assert!(!g.contains_edge("b", "a"));
    }

    #[test]
    fn remove_node_cascades_edges() {
        let mut g = ProvGraph::from_edges(&[("a", "b"), ("b", "c"), ("c", "a")]);
        g.remove_node("b").expect("remove b");
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edges(), vec![("c", "a")]);
        assert!(g.remove_node("b").is_err());
    }

    #[test]
    fn remove_missing_edge_errors() {
        let mut g = ProvGraph::from_edges(&[("a", "b")]);
        assert_eq!(
            g.remove_edge("b", "a"),
            Err(GraphError::EdgeNotFound {
                from: "b".into(),
                to: "a".into()
            })
        );
        g.remove_edge("a", "b").expect("remove a->b");
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn node_order_survives_slot_reuse() {
        let mut g = ProvGraph::from_edges(&[("a", "b"), ("b", "c")]);
        g.remove_node("a").expect("remove a");
        g.add_node("z");
        assert_eq!(g.nodes(), vec!["b", "c", "z"]);
    }

    #[test]
    fn neighbors_follow_edge_insertion_order() {
        let g = ProvGraph::from_edges(&[
            ("s", "x"),
            ("s", "a"),
            ("s", "m"),
            ("p", "s"),
            ("o", "s"),
        ]);
        assert_eq!(g.successors("s"), vec!["x", "a", "m"]);
        assert_eq!(g.predecessors("s"), vec!["p", "o"]);
        assert_eq!(g.out_degree("s"), 3);
        assert_eq!(g.in_degree("s"), 2);
        assert!(g.successors("missing").is_empty());
    }

    #[test]
    fn relabel_keeps_position_and_edges() {
        let mut g = ProvGraph::from_edges(&[("a", "sw.1.0"), ("sw.1.0", "b")]);
        g.set_weight("sw.1.0", 2.5).expect("weight");
        g.relabel("sw.1.0", "sw.").expect("relabel");
        assert_eq!(g.nodes(), vec!["a", "sw.", "b"]);
        assert!(g.contains_edge("a", "sw."));
        assert!(g.contains_edge("sw.", "b"));
        assert_eq!(g.weight("sw."), Some(2.5));
        assert!(!g.contains_node("sw.1.0"));
    }

    #[test]
    fn relabel_onto_existing_node_folds_edges() {
        let mut g = ProvGraph::from_edges(&[("a", "x"), ("b", "y"), ("x", "y")]);
        g.relabel("x", "y").expect("fold");
        assert_eq!(g.nodes(), vec!["a", "b", "y"]);
        assert!(g.contains_edge("a", "y"));
        assert!(g.contains_edge("b", "y"));
        assert!(g.contains_edge("y", "y"));
    }

    #[test]
    fn kind_partitions_nodes() {
        let g = ProvGraph::from_edges(&[("in", "tool.1.0"), ("tool.1.0", "out")]);
        assert_eq!(g.software_nodes(), vec!["tool.1.0"]);
        assert_eq!(g.data_nodes(), vec!["in", "out"]);
    }
}
