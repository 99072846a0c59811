//! Elementary (simple) cycle enumeration.
//!
//! # Algorithm
//!
//! Johnson's algorithm, written iteratively so long cycles cannot overflow
//! the call stack:
//!
//! 1. Self-loops are emitted first as one-node cycles and dropped from the
//!    working graph.
//! 2. Strongly connected components with more than one node are queued.
//! 3. For each component, the lowest-ordered node is the start; every
//!    circuit through it is emitted using Johnson's blocked-set pruning.
//! 4. The start node is removed and the component's remainder is split into
//!    SCCs again.
//!
//! Cycles are reported as node keys in traversal order without repeating the
//! first node, so the closing edge is `(last, first)`.
//!
//! # Complexity
//!
//! O((V + E)(C + 1)) for C cycles. C can be exponential in V, which is why
//! enumeration takes a budget and fails with
//! [`GraphError::CycleBudgetExceeded`] instead of running unbounded.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::error::{GraphError, Result};
use crate::model::ProvGraph;

/// One elementary cycle: node keys in traversal order, first node not repeated.
pub type Cycle = Vec<String>;

/// Enumerate every elementary cycle of `graph`.
///
/// # Errors
///
/// Returns [`GraphError::CycleBudgetExceeded`] as soon as more than
/// `max_cycles` cycles have been found.
pub fn elementary_cycles(graph: &ProvGraph, max_cycles: usize) -> Result<Vec<Cycle>> {
    let keys: Vec<&str> = graph.nodes();
    let position: HashMap<&str, usize> =
        keys.iter().enumerate().map(|(i, key)| (*key, i)).collect();

    let mut work: DiGraphMap<usize, ()> =
        DiGraphMap::with_capacity(keys.len(), graph.edge_count());
    for i in 0..keys.len() {
        work.add_node(i);
    }

    let mut found: Vec<Vec<usize>> = Vec::new();
    for (from, to) in graph.edges() {
        let (a, b) = (position[from], position[to]);
        if a == b {
            push_cycle(&mut found, vec![a], max_cycles)?;
        } else {
            work.add_edge(a, b, ());
        }
    }

    let mut components: Vec<Vec<usize>> = nontrivial_sccs(&work);
    while let Some(component) = components.pop() {
        let mut sub = induced_subgraph(&work, &component);
        let Some(&start) = component.iter().min() else {
            continue;
        };
        circuits_from(&sub, start, keys.len(), &mut found, max_cycles)?;
        sub.remove_node(start);
        components.extend(nontrivial_sccs(&sub));
    }

    Ok(found
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|i| keys[i].to_string()).collect())
        .collect())
}

fn push_cycle(found: &mut Vec<Vec<usize>>, cycle: Vec<usize>, max_cycles: usize) -> Result<()> {
    if found.len() >= max_cycles {
        return Err(GraphError::CycleBudgetExceeded { limit: max_cycles });
    }
    found.push(cycle);
    Ok(())
}

fn nontrivial_sccs(graph: &DiGraphMap<usize, ()>) -> Vec<Vec<usize>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .collect()
}

fn induced_subgraph(graph: &DiGraphMap<usize, ()>, members: &[usize]) -> DiGraphMap<usize, ()> {
    let member_set: HashSet<usize> = members.iter().copied().collect();
    let mut sub = DiGraphMap::new();
    let mut ordered = members.to_vec();
    ordered.sort_unstable();
    for &node in &ordered {
        sub.add_node(node);
    }
    for &node in &ordered {
        for next in graph.neighbors(node) {
            if member_set.contains(&next) {
                sub.add_edge(node, next, ());
            }
        }
    }
    sub
}

/// Johnson's circuit search rooted at `start` within one SCC.
fn circuits_from(
    sub: &DiGraphMap<usize, ()>,
    start: usize,
    universe: usize,
    found: &mut Vec<Vec<usize>>,
    max_cycles: usize,
) -> Result<()> {
    let successors = |node: usize| -> Vec<usize> {
        // Reverse so `pop()` walks neighbors in insertion order.
        let mut next: Vec<usize> = sub.neighbors(node).collect();
        next.reverse();
        next
    };

    let mut path: Vec<usize> = vec![start];
    let mut blocked = vec![false; universe];
    let mut closed: HashSet<usize> = HashSet::new();
    let mut block_map: Vec<HashSet<usize>> = vec![HashSet::new(); universe];
    blocked[start] = true;

    let mut stack: Vec<(usize, Vec<usize>)> = vec![(start, successors(start))];
    loop {
        let Some((node, pending)) = stack.last_mut() else {
            break;
        };
        let node = *node;
        if let Some(next) = pending.pop() {
            if next == start {
                push_cycle(found, path.clone(), max_cycles)?;
                closed.extend(path.iter().copied());
            } else if !blocked[next] {
                path.push(next);
                stack.push((next, successors(next)));
                closed.remove(&next);
                blocked[next] = true;
            }
            continue;
        }

        if closed.contains(&node) {
            unblock(node, &mut blocked, &mut block_map);
        } else {
            for next in sub.neighbors(node) {
                block_map[next].insert(node);
            }
        }
        stack.pop();
        path.pop();
    }
    Ok(())
}

fn unblock(node: usize, blocked: &mut [bool], block_map: &mut [HashSet<usize>]) {
    let mut pending = vec![node];
    while let Some(current) = pending.pop() {
        if blocked[current] {
            blocked[current] = false;
            pending.extend(block_map[current].drain());
        }
    }
}
