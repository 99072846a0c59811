//! Integration tests for ranking and impact analytics.
//!
//! # Test Strategy
//!
//! - A small genome-pipeline fixture exercises the analytics end to end,
//!   including the merge → dagify → rank pipeline.
//! - Property tests on random graphs check the invariants: knock-down
//!   counts equal 1 + forward reachability, PageRank mass sums to 1.

use std::collections::HashSet;

use proptest::prelude::*;

use provgraph_core::ProvGraph;
use provgraph_core::cycles::{DagifyConfig, dagify};
use provgraph_core::merge::merge_software_families;
use provgraph_triage::{
    AncestorKeying, PageRankConfig, ancestor_weight, knock_down_and_remove, knocked_down,
    most_important, most_knocked_down, most_knocked_down_data, pagerank,
};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// reads ─▶ bwa.1.0 ─▶ bam ─▶ gatk.4.0 ─▶ vcf ─▶ annot.1.0 ─▶ report
/// ref   ─▶ bwa.1.0       ▲
/// reads ─▶ bwa.2.0 ─▶ bam2 ─┘ (bam2 feeds gatk.4.1 which writes bam)
fn pipeline() -> ProvGraph {
    let mut g = ProvGraph::from_edges(&[
        ("reads", "bwa.1.0"),
        ("ref", "bwa.1.0"),
        ("bwa.1.0", "bam"),
        ("reads", "bwa.2.0"),
        ("bwa.2.0", "bam2"),
        ("bam2", "gatk.4.1"),
        ("gatk.4.1", "bam"),
        ("bam", "gatk.4.0"),
        ("gatk.4.0", "vcf"),
        ("vcf", "annot.1.0"),
        ("annot.1.0", "report"),
    ]);
    for (key, weight) in [
        ("reads", 4.0),
        ("ref", 1.0),
        ("bam", 2.0),
        ("bam2", 0.5),
        ("vcf", 1.0),
        ("report", 0.1),
        ("bwa.1.0", 1.0),
        ("bwa.2.0", 1.0),
        ("gatk.4.0", 1.0),
        ("gatk.4.1", 1.0),
        ("annot.1.0", 1.0),
    ] {
        g.set_weight(key, weight).expect("weight");
    }
    g
}

fn reachable(graph: &ProvGraph, start: &str) -> HashSet<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = vec![start.to_string()];
    while let Some(node) = stack.pop() {
        for next in graph.successors(&node) {
            if seen.insert(next.to_string()) {
                stack.push(next.to_string());
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn reads_failure_takes_down_the_pipeline() {
    let g = pipeline();
    let best = most_knocked_down_data(&g).expect("sweep").expect("winner");
    assert_eq!(best.node, "reads");
    assert_eq!(best.count, 10);
    assert_eq!(knocked_down(&g, "report").expect("report").count(), 1);
}

#[test]
fn candidate_order_decides_ties() {
    let g = ProvGraph::from_edges(&[("a", "x"), ("b", "y")]);
    let best = most_knocked_down(&g, &["b", "a"]).expect("sweep").expect("winner");
    assert_eq!(best.node, "b");
}

#[test]
fn report_sink_is_most_important() {
    let g = pipeline();
    let result = pagerank(&g, &PageRankConfig::default()).expect("pagerank");
    assert!(result.converged);
    let top = most_important(&result).expect("top");
    assert_eq!(top.node, "report");
}

#[test]
fn jump_one_step_behind_vcf() {
    let g = pipeline();
    let result = ancestor_weight(&g, "gatk.4.0", AncestorKeying::Predecessor).expect("weigh");
    // gatk.4.0 <- bam <- {bwa.1.0, gatk.4.1}
    assert_eq!(result, vec![("bam".to_string(), 2.0)]);

    let by_grandparent = ancestor_weight(&g, "gatk.4.0", AncestorKeying::LastGrandparent).expect("weigh");
    assert_eq!(by_grandparent, vec![("gatk.4.1".to_string(), 2.0)]);
}

#[test]
fn merge_dagify_rank_pipeline() {
    let mut g = pipeline();
    // Feed the variant caller's output back into the aligner: a cycle.
    g.add_edge("vcf", "bwa.2.0");

    let (merged, report) = merge_software_families(g).expect("merge");
    assert_eq!(report.absorbed(), 2);
    let outcome = dagify(merged, &DagifyConfig::default()).expect("dagify");
    assert!(!outcome.removed.is_empty());

    let result = pagerank(&outcome.graph, &PageRankConfig::default()).expect("pagerank");
    let total: f64 = result.scores.iter().map(|(_, s)| s).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn destructive_knock_down_leaves_upstream() {
    let mut g = pipeline();
    let result = knock_down_and_remove(&mut g, "vcf").expect("knock");
    assert_eq!(result.knocked, vec!["vcf", "annot.1.0", "report"]);
    assert!(g.contains_node("gatk.4.0"));
    assert!(!g.contains_node("report"));
    assert_eq!(g.node_count(), 8);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const KEYS: [&str; 8] = ["a", "b", "c", "d", "t.1.0", "t.2.0", "u.1.0", "v.1.0"];

fn arb_graph() -> impl Strategy<Value = ProvGraph> {
    prop::collection::vec((0..KEYS.len(), 0..KEYS.len()), 0..30).prop_map(|pairs| {
        let mut graph = ProvGraph::new();
        for key in KEYS {
            graph.add_node(key);
        }
        for (a, b) in pairs {
            graph.add_edge(KEYS[a], KEYS[b]);
        }
        graph
    })
}

proptest! {
    #[test]
    fn prop_knock_down_is_reachability_plus_start(graph in arb_graph(), start in 0..KEYS.len()) {
        let key = KEYS[start];
        let mut expected = reachable(&graph, key);
        expected.insert(key.to_string());
        let result = knocked_down(&graph, key).expect("knock");
        prop_assert_eq!(result.count(), expected.len());
        prop_assert_eq!(result.knocked[0].as_str(), key);
    }

    #[test]
    fn prop_pagerank_mass_is_one(graph in arb_graph(), tolerance in prop::sample::select(vec![1e-3, 1e-6, 1e-9])) {
        let config = PageRankConfig { tolerance, ..PageRankConfig::default() };
        let result = pagerank(&graph, &config).expect("pagerank");
        let total: f64 = result.scores.iter().map(|(_, s)| s).sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "total = {}", total);
    }

    #[test]
    fn prop_most_important_holds_the_max(graph in arb_graph()) {
        let result = pagerank(&graph, &PageRankConfig::default()).expect("pagerank");
        let top = most_important(&result).expect("top");
        for (_, score) in &result.scores {
            prop_assert!(*score <= top.score);
        }
    }
}
