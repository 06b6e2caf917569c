//! Cycle guard and cycle reporting for the dependency graph.
//!
//! # Overview
//!
//! Dependencies form a directed graph that must stay acyclic: an issue on a
//! cycle waits on itself and can never start. Two entry points:
//!
//! - [`would_create_cycle`] / [`cycle_path_on_add`] run before an edge is
//!   added. Adding `dependent → prerequisite` closes a cycle exactly when
//!   `prerequisite` already reaches `dependent` by following dependency
//!   edges, so a breadth-first search from `prerequisite` answers it.
//! - [`find_all_cycles`] reports cycles that already exist, e.g. in imported
//!   data. These are never repaired automatically: which edge to drop is a
//!   judgement call left to the user.
//!
//! Both are O(V+E) with a visited set.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::Serialize;

use super::engine::GraphEngine;

// ---------------------------------------------------------------------------
// CycleReport
// ---------------------------------------------------------------------------

/// A dependency cycle found in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// The ordered list of issue ids forming the loop, following dependency
    /// edges and ending where it started, e.g. `["A", "B", "C", "A"]`.
    pub cycle_path: Vec<String>,

    /// Dependent side of the back edge that closed the cycle.
    pub edge_from: String,

    /// Prerequisite side of the back edge that closed the cycle.
    pub edge_to: String,
}

impl CycleReport {
    /// Number of distinct issues in the cycle.
    pub fn cycle_len(&self) -> usize {
        self.cycle_path.len().saturating_sub(1)
    }

    /// Returns `true` for a self-loop (issue depends on itself).
    pub fn is_self_loop(&self) -> bool {
        self.edge_from == self.edge_to
    }

    /// Returns `true` for a two-issue cycle (A ↔ B).
    pub fn is_mutual(&self) -> bool {
        self.cycle_len() == 2
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "self-loop on '{}' (issue depends on itself)", self.edge_from)
        } else if self.is_mutual() {
            write!(
                f,
                "mutual dependency between '{}' and '{}'",
                self.edge_from, self.edge_to
            )
        } else {
            write!(
                f,
                "cycle ({} issues): {}",
                self.cycle_len(),
                self.cycle_path.join(" → ")
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle guard
// ---------------------------------------------------------------------------

/// Would adding `dependent → prerequisite` close a cycle?
pub fn would_create_cycle(graph: &GraphEngine, dependent: &str, prerequisite: &str) -> bool {
    cycle_path_on_add(graph, dependent, prerequisite).is_some()
}

/// The cycle that `dependent → prerequisite` would close, if any.
///
/// The path starts at `dependent`, takes the new edge to `prerequisite`,
/// follows existing dependency edges back to `dependent` and ends there:
/// adding `A → C` over `C → B → A` yields `["A", "C", "B", "A"]`.
pub fn cycle_path_on_add(
    graph: &GraphEngine,
    dependent: &str,
    prerequisite: &str,
) -> Option<Vec<String>> {
    if dependent == prerequisite {
        return Some(vec![dependent.to_string(), dependent.to_string()]);
    }

    // BFS from the prerequisite; parent links give the shortest way back.
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([prerequisite]);
    let mut queue: VecDeque<&str> = VecDeque::from([prerequisite]);

    while let Some(current) = queue.pop_front() {
        for next in graph.dependencies(current) {
            let next = next.as_str();
            if !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            if next == dependent {
                return Some(reconstruct_path(&parent, dependent, prerequisite));
            }
            queue.push_back(next);
        }
    }

    None
}

/// Walk parent links from `dependent` back to `prerequisite` and emit the
/// closed loop `dependent → prerequisite → … → dependent`.
fn reconstruct_path(
    parent: &HashMap<&str, &str>,
    dependent: &str,
    prerequisite: &str,
) -> Vec<String> {
    let mut chain = vec![dependent.to_string()];
    let mut current = dependent;
    while current != prerequisite {
        match parent.get(current) {
            Some(&p) => {
                chain.push(p.to_string());
                current = p;
            }
            None => break,
        }
    }
    chain.push(dependent.to_string());
    chain.reverse();
    chain
}

// ---------------------------------------------------------------------------
// Cycle reporting
// ---------------------------------------------------------------------------

/// DFS colors for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// Currently on the DFS stack.
    Gray,
    /// Fully processed.
    Black,
}

/// Report every back edge found by a depth-first search, one cycle each.
///
/// Roots are visited in arena order and neighbours in dependency order, so
/// the output is deterministic. Dangling prerequisites are skipped. The
/// search uses an explicit stack, so deep chains do not hit recursion limits.
pub fn find_all_cycles(graph: &GraphEngine) -> Vec<CycleReport> {
    let mut reports = Vec::new();
    let mut color: HashMap<&str, Color> = graph
        .issues()
        .iter()
        .map(|issue| (issue.id.as_str(), Color::White))
        .collect();

    for root in graph.issues() {
        if color.get(root.id.as_str()) != Some(&Color::White) {
            continue;
        }

        // (node, index of the next dependency to look at)
        let mut stack: Vec<(&str, usize)> = vec![(root.id.as_str(), 0)];
        color.insert(root.id.as_str(), Color::Gray);

        while let Some(frame) = stack.last_mut() {
            let (node, next_idx) = *frame;
            let deps = graph.dependencies(node);

            if next_idx >= deps.len() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let neighbor = deps[next_idx].as_str();
            match color.get(neighbor) {
                Some(Color::White) => {
                    color.insert(neighbor, Color::Gray);
                    stack.push((neighbor, 0));
                }
                Some(Color::Gray) => {
                    // Back edge: the stack from `neighbor` up to `node` is the loop.
                    let start = stack
                        .iter()
                        .position(|(id, _)| *id == neighbor)
                        .unwrap_or(0);
                    let mut cycle_path: Vec<String> =
                        stack[start..].iter().map(|(id, _)| (*id).to_string()).collect();
                    cycle_path.push(neighbor.to_string());
                    reports.push(CycleReport {
                        cycle_path,
                        edge_from: node.to_string(),
                        edge_to: neighbor.to_string(),
                    });
                }
                // Black, or a dangling id that is not a node.
                _ => {}
            }
        }
    }

    reports
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
