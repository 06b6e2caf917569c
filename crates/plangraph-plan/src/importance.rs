//! How much open work each issue is holding up.
//!
//! The score of an issue is the share of open issues that transitively
//! depend on it, in `[0, 1]`. Under [`ImportancePolicy::PriorityWeighted`]
//! each open issue weighs `5 - priority` instead of 1, in both the numerator
//! and the denominator.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet, VecDeque};

use plangraph_core::GraphEngine;
use plangraph_core::config::ImportancePolicy;
use plangraph_core::model::Issue;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueScore {
    pub id: String,
    pub score: f64,
}

/// Drawing hint: an edge is as heavy as its prerequisite is important.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeWeight {
    pub dependent: String,
    pub prerequisite: String,
    pub weight: f64,
}

/// Importance scores for every issue of one graph snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BlockerImportance {
    policy: ImportancePolicy,
    scores: Vec<IssueScore>,
    edges: Vec<EdgeWeight>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl BlockerImportance {
    #[instrument(skip(graph), fields(issues = graph.len()))]
    pub fn new(graph: &GraphEngine, policy: ImportancePolicy) -> Self {
        let total: u32 = graph
            .issues()
            .iter()
            .filter(|issue| issue.is_open())
            .map(|issue| weight(issue, policy))
            .sum();
        let dependents = graph.dependents_index();

        let scores: Vec<IssueScore> = graph
            .issues()
            .iter()
            .map(|issue| {
                let score = if total == 0 {
                    0.0
                } else {
                    let blocked: u32 = open_dependents(graph, &dependents, &issue.id)
                        .into_iter()
                        .map(|d| weight(d, policy))
                        .sum();
                    f64::from(blocked) / f64::from(total)
                };
                IssueScore {
                    id: issue.id.clone(),
                    score,
                }
            })
            .collect();

        let index: HashMap<String, usize> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();

        let edges = graph
            .edges()
            .into_iter()
            .map(|(dependent, prerequisite)| EdgeWeight {
                dependent: dependent.to_string(),
                prerequisite: prerequisite.to_string(),
                weight: index.get(prerequisite).map_or(0.0, |&i| scores[i].score),
            })
            .collect();

        debug!(?policy, open_weight = total, "importance scored");

        Self {
            policy,
            scores,
            edges,
            index,
        }
    }

    /// Score of `id`; 0 for unknown ids.
    pub fn importance(&self, id: &str) -> f64 {
        self.index.get(id).map_or(0.0, |&i| self.scores[i].score)
    }

    /// Every issue's score, in arena order.
    pub fn scores(&self) -> &[IssueScore] {
        &self.scores
    }

    pub fn edge_weights(&self) -> &[EdgeWeight] {
        &self.edges
    }

    pub const fn policy(&self) -> ImportancePolicy {
        self.policy
    }
}

fn weight(issue: &Issue, policy: ImportancePolicy) -> u32 {
    match policy {
        ImportancePolicy::Uniform => 1,
        ImportancePolicy::PriorityWeighted => 5 - u32::from(issue.priority.value()),
    }
}

/// Open issues that reach `id` through dependency edges, excluding `id`.
fn open_dependents<'g>(
    graph: &'g GraphEngine,
    dependents: &HashMap<&'g str, Vec<&'g str>>,
    id: &str,
) -> Vec<&'g Issue> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    if let Some(direct) = dependents.get(id) {
        queue.extend(direct.iter().copied());
    }
    while let Some(current) = queue.pop_front() {
        if current == id || !visited.insert(current) {
            continue;
        }
        if let Some(next) = dependents.get(current) {
            queue.extend(next.iter().copied());
        }
    }
    visited
        .into_iter()
        .filter_map(|dependent| graph.issue(dependent))
        .filter(|issue| issue.is_open())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plangraph_core::model::{Priority, Status};

    fn chain() -> GraphEngine {
        GraphEngine::from_issues([
            Issue::new("A", "A"),
            Issue::new("B", "B").depends_on("A"),
            Issue::new("C", "C").depends_on("B"),
        ])
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn root_of_chain_blocks_everything_downstream() {
        let scores = BlockerImportance::new(&chain(), ImportancePolicy::Uniform);
        assert!(close(scores.importance("A"), 2.0 / 3.0));
        assert!(close(scores.importance("B"), 1.0 / 3.0));
        assert!(close(scores.importance("C"), 0.0));
    }

    #[test]
    fn closed_dependents_do_not_count() {
        let mut graph = chain();
        graph.set_status("C", Status::Closed).unwrap();
        let scores = BlockerImportance::new(&graph, ImportancePolicy::Uniform);
        assert!(close(scores.importance("A"), 0.5));
        assert!(close(scores.importance("B"), 0.0));
    }

    #[test]
    fn priority_weighting_favours_urgent_dependents() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").with_priority(Priority::LOWEST),
            Issue::new("B", "B")
                .with_priority(Priority::HIGHEST)
                .depends_on("A"),
            Issue::new("C", "C").with_priority(Priority::LOWEST),
        ]);
        let uniform = BlockerImportance::new(&graph, ImportancePolicy::Uniform);
        let weighted = BlockerImportance::new(&graph, ImportancePolicy::PriorityWeighted);
        assert!(close(uniform.importance("A"), 1.0 / 3.0));
        // B weighs 5 of a total 7.
        assert!(close(weighted.importance("A"), 5.0 / 7.0));
        assert_eq!(weighted.policy(), ImportancePolicy::PriorityWeighted);
    }

    #[test]
    fn unknown_ids_and_finished_graphs_score_zero() {
        let scores = BlockerImportance::new(&chain(), ImportancePolicy::Uniform);
        assert!(close(scores.importance("ghost"), 0.0));

        let done = GraphEngine::from_issues([
            Issue::new("A", "A").with_status(Status::Closed),
            Issue::new("B", "B").with_status(Status::Closed).depends_on("A"),
        ]);
        let scores = BlockerImportance::new(&done, ImportancePolicy::Uniform);
        assert!(scores.scores().iter().all(|s| close(s.score, 0.0)));
    }

    #[test]
    fn cycle_members_do_not_count_themselves() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").depends_on("B"),
            Issue::new("B", "B").depends_on("A"),
        ]);
        let scores = BlockerImportance::new(&graph, ImportancePolicy::Uniform);
        assert!(close(scores.importance("A"), 0.5));
    }

    #[test]
    fn edges_carry_prerequisite_score() {
        let scores = BlockerImportance::new(&chain(), ImportancePolicy::Uniform);
        let weights: Vec<(&str, &str, f64)> = scores
            .edge_weights()
            .iter()
            .map(|e| (e.dependent.as_str(), e.prerequisite.as_str(), e.weight))
            .collect();
        assert_eq!(weights.len(), 2);
        assert_eq!((weights[0].0, weights[0].1), ("B", "A"));
        assert!(close(weights[0].2, 2.0 / 3.0));
        assert_eq!((weights[1].0, weights[1].1), ("C", "B"));
        assert!(close(weights[1].2, 1.0 / 3.0));
    }
}
