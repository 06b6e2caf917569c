//! The owning dependency graph: issues plus their prerequisite lists.
//!
//! # Overview
//!
//! [`GraphEngine`] is the single mutable source of truth for one plan. It
//! stores issues in an arena (`Vec<Issue>`) with an id → slot index, and the
//! edges as each issue's own `dependencies` list. An edge `A → B` means
//! "A depends on B": B must be closed before A can start.
//!
//! Edges are only added through [`GraphEngine::add_dependency`], which rejects
//! self-references, unknown ids and anything that would close a cycle. Bulk
//! import via [`GraphEngine::from_issues`] and out-of-band deletion via
//! [`GraphEngine::remove_issue`] are not validated; cycles and dangling edges
//! that slip in that way are reported by [`crate::graph::validate`].
//!
//! The engine holds no derived state. Layout, scheduling and health checks
//! recompute everything from the current edges on each call.
//!
//! # Usage
//!
//! ```rust
//! use plangraph_core::{GraphEngine, Issue};
//!
//! let mut engine = GraphEngine::from_issues([
//!     Issue::new("design", "Design"),
//!     Issue::new("build", "Build"),
//! ]);
//! engine.add_dependency("build", "design").unwrap();
//! assert!(engine.transitive_dependencies("build").contains("design"));
//! assert!(engine.add_dependency("design", "build").is_err());
//! ```

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::graph::cycles;
use crate::model::{Issue, Status};

/// An issue graph with guarded edge mutation.
#[derive(Debug, Clone, Default)]
pub struct GraphEngine {
    issues: Vec<Issue>,
    index: HashMap<String, usize>,
}

impl GraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from issues as they are, without validating edges.
    ///
    /// A repeated id replaces the earlier issue in place. Repeated entries in
    /// a `dependencies` list are collapsed to the first occurrence.
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let mut engine = Self::new();
        for issue in issues {
            engine.insert_issue(issue);
        }
        debug!(
            issues = engine.len(),
            edges = engine.edge_count(),
            "graph imported"
        );
        engine
    }

    /// Insert an issue, replacing any issue with the same id.
    ///
    /// The replacement keeps the original arena slot so ordering stays stable.
    /// Its `dependencies` are taken as given (deduplicated, not validated).
    pub fn insert_issue(&mut self, mut issue: Issue) {
        dedup_in_order(&mut issue.dependencies);
        if let Some(&slot) = self.index.get(&issue.id) {
            self.issues[slot] = issue;
        } else {
            self.index.insert(issue.id.clone(), self.issues.len());
            self.issues.push(issue);
        }
    }

    /// Remove an issue.
    ///
    /// Edges from other issues that point at it are left in place and show
    /// up as invalid edges until repaired.
    pub fn remove_issue(&mut self, id: &str) -> Option<Issue> {
        let slot = self.index.remove(id)?;
        let removed = self.issues.remove(slot);
        self.rebuild_index();
        Some(removed)
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .issues
            .iter()
            .enumerate()
            .map(|(slot, issue)| (issue.id.clone(), slot))
            .collect();
    }

    /// Change the status of an existing issue.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if `id` is unknown.
    pub fn set_status(&mut self, id: &str, status: Status) -> Result<(), GraphError> {
        let issue = self
            .issue_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        issue.status = status;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Guarded edge mutation
    // -----------------------------------------------------------------------

    /// Record that `dependent` cannot start until `prerequisite` is closed.
    ///
    /// Adding an edge that already exists is a successful no-op.
    ///
    /// # Errors
    ///
    /// - [`GraphError::SelfReference`] if both ids are equal.
    /// - [`GraphError::NotFound`] if either id is unknown.
    /// - [`GraphError::CycleDetected`] if `prerequisite` already depends,
    ///   directly or transitively, on `dependent`.
    ///
    /// The graph is unchanged whenever an error is returned.
    pub fn add_dependency(
        &mut self,
        dependent: &str,
        prerequisite: &str,
    ) -> Result<(), GraphError> {
        if dependent == prerequisite {
            warn!(dependent, "rejected self-referencing dependency");
            return Err(GraphError::SelfReference(dependent.to_string()));
        }
        if !self.contains(dependent) {
            return Err(GraphError::NotFound(dependent.to_string()));
        }
        if !self.contains(prerequisite) {
            return Err(GraphError::NotFound(prerequisite.to_string()));
        }

        if let Some(path) = cycles::cycle_path_on_add(self, dependent, prerequisite) {
            warn!(dependent, prerequisite, "rejected dependency that would close a cycle");
            return Err(GraphError::CycleDetected {
                dependent: dependent.to_string(),
                prerequisite: prerequisite.to_string(),
                path,
            });
        }

        if let Some(issue) = self.issue_mut(dependent) {
            if !issue.dependencies.iter().any(|p| p == prerequisite) {
                issue.dependencies.push(prerequisite.to_string());
                debug!(dependent, prerequisite, "dependency added");
            }
        }
        Ok(())
    }

    /// Remove the edge `dependent → prerequisite`. Returns whether it existed.
    pub fn remove_dependency(&mut self, dependent: &str, prerequisite: &str) -> bool {
        let Some(issue) = self.issue_mut(dependent) else {
            return false;
        };
        let before = issue.dependencies.len();
        issue.dependencies.retain(|p| p != prerequisite);
        before != issue.dependencies.len()
    }

    /// Side-effect-free check: would `dependent → prerequisite` close a cycle?
    ///
    /// A self-edge counts as a cycle.
    pub fn would_create_cycle(&self, dependent: &str, prerequisite: &str) -> bool {
        cycles::would_create_cycle(self, dependent, prerequisite)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.index.get(id).map(|&slot| &self.issues[slot])
    }

    fn issue_mut(&mut self, id: &str) -> Option<&mut Issue> {
        let slot = *self.index.get(id)?;
        self.issues.get_mut(slot)
    }

    /// All issues in arena (insertion) order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of issues that are not closed.
    pub fn open_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_open()).count()
    }

    /// Direct prerequisites of `id`, in insertion order. Empty if unknown.
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.issue(id)
            .map(|issue| issue.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Issues that list `id` as a direct prerequisite, in arena order.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| issue.dependencies.iter().any(|p| p == id))
            .map(|issue| issue.id.as_str())
            .collect()
    }

    /// Every `(dependent, prerequisite)` edge, dependents in arena order and
    /// prerequisites in insertion order. Dangling edges are included.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.issues
            .iter()
            .flat_map(|issue| {
                issue
                    .dependencies
                    .iter()
                    .map(move |p| (issue.id.as_str(), p.as_str()))
            })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.issues.iter().map(|issue| issue.dependencies.len()).sum()
    }

    /// Everything that must finish, directly or indirectly, before `id`.
    ///
    /// `id` itself is only included if it sits on a cycle.
    pub fn transitive_dependencies(&self, id: &str) -> BTreeSet<String> {
        let mut reached = BTreeSet::new();
        let mut queue: VecDeque<&str> = self.dependencies(id).iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            if !reached.insert(current.to_string()) {
                continue;
            }
            queue.extend(self.dependencies(current).iter().map(String::as_str));
        }

        reached
    }

    /// Everything that waits, directly or indirectly, on `id`.
    pub fn transitive_dependents(&self, id: &str) -> BTreeSet<String> {
        let reverse = self.dependents_index();
        let mut reached = BTreeSet::new();
        let mut queue: VecDeque<&str> = reverse.get(id).cloned().unwrap_or_default().into();

        while let Some(current) = queue.pop_front() {
            if !reached.insert(current.to_string()) {
                continue;
            }
            if let Some(next) = reverse.get(current) {
                queue.extend(next.iter().copied());
            }
        }

        reached
    }

    /// prerequisite id → direct dependents, built from the current edges.
    pub fn dependents_index(&self) -> HashMap<&str, Vec<&str>> {
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for (dependent, prerequisite) in self.edges() {
            reverse.entry(prerequisite).or_default().push(dependent);
        }
        reverse
    }

    /// Reachability map for every issue: id → transitive dependencies.
    pub fn transitive_closure(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.issues
            .iter()
            .map(|issue| (issue.id.clone(), self.transitive_dependencies(&issue.id)))
            .collect()
    }

    /// BLAKE3 hash of the edge list in stored order.
    ///
    /// Two engines with the same hash hold the same edges in the same order.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (dependent, prerequisite) in self.edges() {
            hasher.update(dependent.as_bytes());
            hasher.update(b"\x00");
            hasher.update(prerequisite.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }

    // -----------------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------------

    /// Open issues whose prerequisites are all closed.
    pub fn ready_issues(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.is_open() && !self.has_open_prerequisite(issue))
            .collect()
    }

    /// Open issues waiting on at least one unfinished or unknown prerequisite.
    pub fn blocked_issues(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.is_open() && self.has_open_prerequisite(issue))
            .collect()
    }

    fn has_open_prerequisite(&self, issue: &Issue) -> bool {
        issue
            .dependencies
            .iter()
            .any(|p| self.issue(p).is_none_or(Issue::is_open))
    }

    /// A warning message when more open issues exist than `limit`.
    pub fn size_warning(&self, limit: usize) -> Option<String> {
        let open = self.open_count();
        (open > limit).then(|| {
            format!(
                "{open} open issues exceed the recommended maximum of {limit}; \
                 the graph may be hard to read"
            )
        })
    }
}

fn dedup_in_order(ids: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
