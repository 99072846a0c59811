//! JSON adapter between files and [`ProvGraph`].
//!
//! The CLI exchanges graphs as a small JSON document:
//!
//! ```json
//! {
//!   "nodes": [{"id": "reads", "weight": 4.0}, {"id": "bwa.1.0"}],
//!   "edges": [["reads", "bwa.1.0"]]
//! }
//! ```
//!
//! Nodes listed in `nodes` keep that order; nodes only mentioned by an edge
//! are appended on first mention.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use provgraph_core::ProvGraph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl GraphDocument {
    #[must_use]
    pub fn into_graph(self) -> ProvGraph {
        let mut graph = ProvGraph::new();
        for node in self.nodes {
            match node.weight {
                Some(weight) => graph.add_weighted_node(&node.id, weight),
                None => {
                    graph.add_node(&node.id);
                }
            }
        }
        for (from, to) in self.edges {
            graph.add_edge(&from, &to);
        }
        graph
    }

    #[must_use]
    pub fn from_graph(graph: &ProvGraph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .into_iter()
                .map(|key| NodeEntry {
                    id: key.to_string(),
                    weight: graph.weight(key),
                })
                .collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

/// Read a graph document from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a graph document.
pub fn read_graph(path: &Path) -> Result<ProvGraph> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read graph {}", path.display()))?;
    let doc: GraphDocument = serde_json::from_str(&raw)
        .with_context(|| format!("parse graph {}", path.display()))?;
    Ok(doc.into_graph())
}

/// Write `graph` as pretty JSON to `path`, or to stdout when `None`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_graph(graph: &ProvGraph, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&GraphDocument::from_graph(graph))
        .context("serialize graph")?;
    match path {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("write graph {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("write graph to stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trip_preserves_order_and_weights() {
        let raw = r#"{
            "nodes": [{"id": "z", "weight": 1.5}, {"id": "tool.1.0"}],
            "edges": [["z", "tool.1.0"], ["tool.1.0", "out"]]
        }"#;
        let doc: GraphDocument = serde_json::from_str(raw).expect("parse");
        let graph = doc.clone().into_graph();
        assert_eq!(graph.nodes(), vec!["z", "tool.1.0", "out"]);
        assert_eq!(graph.weight("z"), Some(1.5));

        let back = GraphDocument::from_graph(&graph);
        assert_eq!(back.edges, doc.edges);
        assert_eq!(back.nodes[2], NodeEntry { id: "out".into(), weight: None });
    }

    #[test]
    fn missing_sections_are_empty() {
        let doc: GraphDocument = serde_json::from_str("{}").expect("parse");
        assert!(doc.into_graph().is_empty());
    }
}
