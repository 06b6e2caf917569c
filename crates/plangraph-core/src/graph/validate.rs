//! Data-quality checks and explicit repairs for the dependency graph.
//!
//! # Overview
//!
//! Three kinds of findings, none of which is an error:
//!
//! - **Invalid edges**: a prerequisite id that names no issue, typically
//!   left behind when an issue is deleted out of band.
//! - **Redundant edges**: `A → C` where `C` is already reachable from `A`
//!   through another prerequisite `B`. Dropping them is a transitive
//!   reduction: the reachability of the graph stays the same.
//! - **Cycles**: only possible through imported data; see
//!   [`crate::graph::cycles::find_all_cycles`].
//!
//! [`health`] bundles all three. Repairs run only on request
//! ([`remove_invalid_edges`], [`remove_redundant_edges`]); cycles are never
//! repaired automatically.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::cycles::{CycleReport, find_all_cycles};
use super::engine::GraphEngine;

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// An edge whose prerequisite id is not a known issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEdge {
    pub dependent: String,
    pub missing: String,
}

/// An edge implied by a longer path through `through`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedundantEdge {
    pub dependent: String,
    pub prerequisite: String,
    /// The other direct prerequisite of `dependent` that already reaches
    /// `prerequisite`.
    pub through: String,
}

/// Aggregate data-quality report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub cycles: Vec<CycleReport>,
    pub invalid_edges: Vec<InvalidEdge>,
    pub redundant_edges: Vec<RedundantEdge>,
    pub is_healthy: bool,
}

impl HealthReport {
    /// Total number of findings across all categories.
    pub fn issue_count(&self) -> usize {
        self.cycles.len() + self.invalid_edges.len() + self.redundant_edges.len()
    }
}

// ---------------------------------------------------------------------------
// Invalid edges
// ---------------------------------------------------------------------------

/// Edges pointing at ids that are not in the graph.
pub fn find_invalid_edges(graph: &GraphEngine) -> Vec<InvalidEdge> {
    graph
        .edges()
        .into_iter()
        .filter(|(_, prerequisite)| !graph.contains(prerequisite))
        .map(|(dependent, missing)| InvalidEdge {
            dependent: dependent.to_string(),
            missing: missing.to_string(),
        })
        .collect()
}

/// Delete every invalid edge. Returns how many were removed.
#[instrument(skip(graph))]
pub fn remove_invalid_edges(graph: &mut GraphEngine) -> usize {
    let invalid = find_invalid_edges(graph);
    for edge in &invalid {
        graph.remove_dependency(&edge.dependent, &edge.missing);
    }
    if !invalid.is_empty() {
        info!(removed = invalid.len(), "removed invalid edges");
    }
    invalid.len()
}

// ---------------------------------------------------------------------------
// Redundant edges
// ---------------------------------------------------------------------------

/// Edges between known issues that a longer path already implies.
///
/// For each edge `A → C` the other direct prerequisites of `A` are tried in
/// dependency order; the first one that reaches `C` is reported as
/// `through`. Dangling edges are left to [`find_invalid_edges`].
pub fn find_redundant_edges(graph: &GraphEngine) -> Vec<RedundantEdge> {
    let mut found = Vec::new();
    for issue in graph.issues() {
        for prerequisite in &issue.dependencies {
            if !graph.contains(prerequisite) {
                continue;
            }
            if let Some(through) = alternative_route(graph, &issue.id, prerequisite) {
                found.push(RedundantEdge {
                    dependent: issue.id.clone(),
                    prerequisite: prerequisite.clone(),
                    through,
                });
            }
        }
    }
    found
}

/// Transitive reduction: remove every redundant edge.
///
/// Edges are re-checked one at a time against the graph as it currently
/// stands, so the transitive closure never changes, even on cyclic input.
/// A second call always returns 0.
#[instrument(skip(graph))]
pub fn remove_redundant_edges(graph: &mut GraphEngine) -> usize {
    let candidates: Vec<(String, String)> = graph
        .edges()
        .into_iter()
        .filter(|(_, prerequisite)| graph.contains(prerequisite))
        .map(|(d, p)| (d.to_string(), p.to_string()))
        .collect();

    let mut removed = 0;
    for (dependent, prerequisite) in candidates {
        if let Some(through) = alternative_route(graph, &dependent, &prerequisite) {
            debug!(%dependent, %prerequisite, %through, "dropping redundant edge");
            graph.remove_dependency(&dependent, &prerequisite);
            removed += 1;
        }
    }

    if removed > 0 {
        info!(removed, "transitive reduction applied");
    }
    removed
}

/// First direct prerequisite of `dependent`, other than `target`, from
/// which `target` is reachable.
fn alternative_route(graph: &GraphEngine, dependent: &str, target: &str) -> Option<String> {
    graph
        .dependencies(dependent)
        .iter()
        .filter(|other| other.as_str() != target)
        .find(|other| reaches_without_edge(graph, other, target, dependent))
        .cloned()
}

/// BFS along dependency edges: does `from` reach `target` without using the
/// direct edge `dependent → target`?
fn reaches_without_edge(graph: &GraphEngine, from: &str, target: &str, dependent: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::from([from]);
    let mut queue: VecDeque<&str> = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        for next in graph.dependencies(current) {
            if current == dependent && next == target {
                continue;
            }
            if next == target {
                return true;
            }
            if visited.insert(next.as_str()) {
                queue.push_back(next.as_str());
            }
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Pre-existing cycles, reported but never repaired.
pub fn find_cycles(graph: &GraphEngine) -> Vec<CycleReport> {
    find_all_cycles(graph)
}

/// Run every check and summarise.
#[instrument(skip(graph), fields(issues = graph.len(), edges = graph.edge_count()))]
pub fn health(graph: &GraphEngine) -> HealthReport {
    let cycles = find_cycles(graph);
    let invalid_edges = find_invalid_edges(graph);
    let redundant_edges = find_redundant_edges(graph);
    let is_healthy = cycles.is_empty() && invalid_edges.is_empty() && redundant_edges.is_empty();

    debug!(
        cycles = cycles.len(),
        invalid = invalid_edges.len(),
        redundant = redundant_edges.len(),
        "health check complete"
    );

    HealthReport {
        cycles,
        invalid_edges,
        redundant_edges,
        is_healthy,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
