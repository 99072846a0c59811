//! Software executions in version order, with the data each first generated.
//!
//! Execution keys follow `name.version.index`. Sorting by the numeric
//! `version` field approximates the order in which executions ran; walking
//! them in that order and claiming each output artifact only once yields the
//! artifacts every execution generated first. Executions that claim no new
//! artifact are left out of the listing.
//!
//! Keys whose second field is missing or is not an unsigned integer cannot
//! be placed in that order. They are listed after every orderable execution,
//! in graph order, and flagged as [`ExecutionEntry::unordered`].

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{ProvGraph, SEPARATOR};

/// One software execution and the artifacts it generated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionEntry {
    pub software: String,
    /// Parsed version field, `None` when unparsable.
    pub version: Option<u64>,
    /// Successors not already claimed by an earlier execution.
    pub generated: Vec<String>,
    /// True when the key had no numeric version field.
    pub unordered: bool,
}

/// Numeric second field of a software key (`name.<n>.…`).
#[must_use]
pub fn version_field(key: &str) -> Option<u64> {
    key.split(SEPARATOR).nth(1)?.parse().ok()
}

/// List software executions ordered by version field.
#[must_use]
pub fn execution_order(graph: &ProvGraph) -> Vec<ExecutionEntry> {
    let software = graph.software_nodes();
    let mut ordered: Vec<(&str, u64)> = Vec::with_capacity(software.len());
    let mut unordered: Vec<&str> = Vec::new();
    for key in software {
        match version_field(key) {
            Some(version) => ordered.push((key, version)),
            None => unordered.push(key),
        }
    }
    ordered.sort_by_key(|(_, version)| *version);

    let mut claimed: HashSet<&str> = HashSet::new();
    let sequence = ordered
        .into_iter()
        .map(|(key, version)| (key, Some(version)))
        .chain(unordered.into_iter().map(|key| (key, None)));

    sequence
        .filter_map(|(key, version)| {
            let generated: Vec<String> = graph
                .successors(key)
                .into_iter()
                .filter(|succ| claimed.insert(*succ))
                .map(str::to_string)
                .collect();
            (!generated.is_empty()).then(|| ExecutionEntry {
                software: key.to_string(),
                version,
                generated,
                unordered: version.is_none(),
            })
        })
        .collect()
}
