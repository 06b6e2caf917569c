//! Duration-based scheduling with critical-path analysis.
//!
//! # Definitions
//!
//! All times are whole days from project start.
//!
//! | Term              | Definition |
//! |-------------------|------------|
//! | `start_day`       | Earliest start: latest `end_day` among scheduled prerequisites, 0 if none. |
//! | `end_day`         | `start_day + expected_days`, saturating at `u32::MAX`. |
//! | `latest_finish`   | Latest finish that does not push the makespan out. |
//! | `slack`           | `latest_finish - end_day`; zero on the critical path. |
//! | `row`             | Lane in a Gantt-style drawing; tasks in one row never overlap. |
//!
//! # Algorithm
//!
//! 1. Topological order by DFS post-order over dependency edges, roots in
//!    arena order.
//! 2. **Forward pass** with expected durations; the min and max bounds get
//!    their own forward pass for [`PlanTotals`].
//! 3. **Lane packing** in topological order: each task takes the lowest row
//!    whose intervals do not overlap `[start_day, end_day)`.
//! 4. **Backward pass** from the makespan; a task is critical when its
//!    earliest and latest finish coincide.
//! 5. **Path reconstruction**: from the critical task that finishes last,
//!    walk back through critical prerequisites that end exactly when the
//!    current task starts.
//!
//! Closed issues are finished work: they are left out and edges to them
//! count as satisfied, unless [`ScheduleConfig::include_closed`] is set.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, VisitMap};
use plangraph_core::GraphEngine;
use plangraph_core::config::ScheduleConfig;
use plangraph_core::model::{DurationEstimate, Issue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Estimates supplied from outside the graph (e.g. by an estimator service).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimateSet {
    #[serde(default)]
    pub estimates: HashMap<String, DurationEstimate>,
    /// A critical path asserted by the estimator. Advisory only: it is
    /// compared against the computed one, never substituted for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_path: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub id: String,
    pub start_day: u32,
    pub end_day: u32,
    pub row: usize,
    pub is_on_critical_path: bool,
    pub slack: u32,
}

/// Project length under each estimate bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanTotals {
    pub min_days: u32,
    pub expected_days: u32,
    pub max_days: u32,
}

/// How an asserted critical path compares to the computed critical tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriticalPathCheck {
    pub agrees: bool,
    /// Computed critical tasks the assertion left out.
    pub missing: Vec<String>,
    /// Asserted ids that are not critical (or not scheduled at all).
    pub unexpected: Vec<String>,
}

/// Result of [`compute_schedule`]. Tasks are in topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub tasks: Vec<ScheduledTask>,
    pub totals: PlanTotals,
    /// One critical chain, prerequisites first.
    pub critical_path: Vec<String>,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_path_check: Option<CriticalPathCheck>,
}

impl Schedule {
    pub fn task(&self, id: &str) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Expected project length in days.
    pub const fn makespan(&self) -> u32 {
        self.totals.expected_days
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[instrument(skip_all, fields(issues = graph.len()))]
pub fn compute_schedule(
    graph: &GraphEngine,
    estimates: &EstimateSet,
    config: &ScheduleConfig,
) -> Schedule {
    let nodes: Vec<&Issue> = graph
        .issues()
        .iter()
        .filter(|issue| config.include_closed || issue.is_open())
        .collect();

    let slot: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, issue)| (issue.id.as_str(), i))
        .collect();
    let prerequisites: Vec<Vec<usize>> = nodes
        .iter()
        .map(|issue| {
            issue
                .dependencies
                .iter()
                .filter_map(|dep| slot.get(dep.as_str()).copied())
                .collect()
        })
        .collect();
    let bounds: Vec<DurationEstimate> = nodes
        .iter()
        .map(|issue| estimate_for(issue, estimates, config))
        .collect();

    let order = topological_order(&prerequisites);

    let expected: Vec<u32> = bounds.iter().map(|b| b.expected_days).collect();
    let min: Vec<u32> = bounds.iter().map(|b| b.min_days).collect();
    let max: Vec<u32> = bounds.iter().map(|b| b.max_days).collect();

    let timing = forward_pass(&order, &prerequisites, &expected);
    let totals = PlanTotals {
        min_days: makespan(&forward_pass(&order, &prerequisites, &min)),
        expected_days: makespan(&timing),
        max_days: makespan(&forward_pass(&order, &prerequisites, &max)),
    };

    let rows = pack_rows(&order, &timing, nodes.len());
    let row_count = rows.iter().map(|r| r + 1).max().unwrap_or(0);
    let latest_finish = backward_pass(&order, &prerequisites, &expected, totals.expected_days);

    let tasks: Vec<ScheduledTask> = order
        .iter()
        .map(|&i| {
            let (start_day, end_day) = timing[i];
            ScheduledTask {
                id: nodes[i].id.clone(),
                start_day,
                end_day,
                row: rows[i],
                is_on_critical_path: latest_finish[i] == end_day,
                slack: latest_finish[i].saturating_sub(end_day),
            }
        })
        .collect();

    let critical: Vec<bool> = (0..nodes.len())
        .map(|i| latest_finish[i] == timing[i].1)
        .collect();
    let critical_path: Vec<String> =
        reconstruct_critical_path(&order, &prerequisites, &timing, &critical)
            .into_iter()
            .map(|i| nodes[i].id.clone())
            .collect();

    let critical_path_check = estimates
        .critical_path
        .as_deref()
        .map(|asserted| check_critical_path(asserted, &tasks));

    debug!(
        tasks = tasks.len(),
        makespan = totals.expected_days,
        rows = row_count,
        "schedule computed"
    );

    Schedule {
        tasks,
        totals,
        critical_path,
        row_count,
        critical_path_check,
    }
}

/// Provider estimate, then the issue's own, then the configured default.
fn estimate_for(
    issue: &Issue,
    estimates: &EstimateSet,
    config: &ScheduleConfig,
) -> DurationEstimate {
    estimates
        .estimates
        .get(&issue.id)
        .or(issue.estimate.as_ref())
        .cloned()
        .unwrap_or_else(|| DurationEstimate::fixed(config.default_expected_days))
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Prerequisites before dependents. Every node appears once even when the
/// input holds cycles.
fn topological_order(prerequisites: &[Vec<usize>]) -> Vec<usize> {
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(prerequisites.len(), 0);
    for _ in prerequisites {
        graph.add_node(());
    }
    for (dependent, prereqs) in prerequisites.iter().enumerate() {
        for &p in prereqs {
            graph.add_edge(NodeIndex::new(dependent), NodeIndex::new(p), ());
        }
    }

    let mut order = Vec::with_capacity(prerequisites.len());
    let mut dfs = DfsPostOrder::empty(&graph);
    for root in graph.node_indices() {
        if dfs.discovered.is_visited(&root) {
            continue;
        }
        dfs.move_to(root);
        while let Some(node) = dfs.next(&graph) {
            order.push(node.index());
        }
    }
    order
}

fn forward_pass(
    order: &[usize],
    prerequisites: &[Vec<usize>],
    durations: &[u32],
) -> Vec<(u32, u32)> {
    let mut timing = vec![(0u32, 0u32); durations.len()];
    for &i in order {
        let start = prerequisites[i].iter().map(|&p| timing[p].1).max().unwrap_or(0);
        timing[i] = (start, start.saturating_add(durations[i]));
    }
    timing
}

fn makespan(timing: &[(u32, u32)]) -> u32 {
    timing.iter().map(|&(_, end)| end).max().unwrap_or(0)
}

/// Row per node. Zero-length intervals overlap nothing.
fn pack_rows(order: &[usize], timing: &[(u32, u32)], len: usize) -> Vec<usize> {
    let mut lanes: Vec<Vec<(u32, u32)>> = Vec::new();
    let mut rows = vec![0usize; len];
    for &i in order {
        let interval = timing[i];
        let row = lanes
            .iter()
            .position(|lane| lane.iter().all(|&placed| !overlaps(placed, interval)))
            .unwrap_or(lanes.len());
        if row == lanes.len() {
            lanes.push(Vec::new());
        }
        lanes[row].push(interval);
        rows[i] = row;
    }
    rows
}

const fn overlaps(a: (u32, u32), b: (u32, u32)) -> bool {
    a.0 < a.1 && b.0 < b.1 && a.0 < b.1 && b.0 < a.1
}

/// Latest finish per node, walking the topological order backwards.
fn backward_pass(
    order: &[usize],
    prerequisites: &[Vec<usize>],
    durations: &[u32],
    project_finish: u32,
) -> Vec<u32> {
    let mut latest_finish = vec![project_finish; durations.len()];
    for &i in order.iter().rev() {
        let latest_start = latest_finish[i].saturating_sub(durations[i]);
        for &p in &prerequisites[i] {
            latest_finish[p] = latest_finish[p].min(latest_start);
        }
    }
    latest_finish
}

fn reconstruct_critical_path(
    order: &[usize],
    prerequisites: &[Vec<usize>],
    timing: &[(u32, u32)],
    critical: &[bool],
) -> Vec<usize> {
    let mut sink: Option<usize> = None;
    for &i in order {
        if critical[i] && sink.is_none_or(|s| timing[i].1 > timing[s].1) {
            sink = Some(i);
        }
    }
    let Some(sink) = sink else {
        return Vec::new();
    };

    let mut path = vec![sink];
    let mut seen: HashSet<usize> = HashSet::from([sink]);
    let mut current = sink;
    while let Some(&prev) = prerequisites[current]
        .iter()
        .find(|&&p| critical[p] && timing[p].1 == timing[current].0 && !seen.contains(&p))
    {
        seen.insert(prev);
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

fn check_critical_path(asserted: &[String], tasks: &[ScheduledTask]) -> CriticalPathCheck {
    let asserted_set: HashSet<&str> = asserted.iter().map(String::as_str).collect();
    let critical: HashSet<&str> = tasks
        .iter()
        .filter(|t| t.is_on_critical_path)
        .map(|t| t.id.as_str())
        .collect();

    let missing: Vec<String> = tasks
        .iter()
        .filter(|t| t.is_on_critical_path && !asserted_set.contains(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect();
    let unexpected: Vec<String> = asserted
        .iter()
        .filter(|id| !critical.contains(id.as_str()))
        .cloned()
        .collect();
    let agrees = missing.is_empty() && unexpected.is_empty();

    if !agrees {
        warn!(
            ?missing,
            ?unexpected,
            "asserted critical path disagrees with computed schedule; keeping computed"
        );
    }

    CriticalPathCheck {
        agrees,
        missing,
        unexpected,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use plangraph_core::model::Status;

    fn days(min: u32, expected: u32, max: u32) -> DurationEstimate {
        DurationEstimate {
            min_days: min,
            expected_days: expected,
            max_days: max,
            confidence: 0.5,
            reasoning: None,
        }
    }

    fn chain_2_3_1() -> GraphEngine {
        GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(DurationEstimate::fixed(2)),
            Issue::new("B", "B")
                .with_estimate(DurationEstimate::fixed(3))
                .depends_on("A"),
            Issue::new("C", "C")
                .with_estimate(DurationEstimate::fixed(1))
                .depends_on("B"),
        ])
    }

    fn schedule_of(graph: &GraphEngine) -> Schedule {
        compute_schedule(graph, &EstimateSet::default(), &ScheduleConfig::default())
    }

    fn span(schedule: &Schedule, id: &str) -> Option<(u32, u32)> {
        schedule.task(id).map(|t| (t.start_day, t.end_day))
    }

    // -----------------------------------------------------------------------
    // Forward pass
    // -----------------------------------------------------------------------

    #[test]
    fn chain_runs_back_to_back() {
        let schedule = compute_schedule(
            &chain_2_3_1(),
            &EstimateSet::default(),
            &ScheduleConfig::default(),
        );
        assert_eq!(span(&schedule, "A"), Some((0, 2)));
        assert_eq!(span(&schedule, "B"), Some((2, 5)));
        assert_eq!(span(&schedule, "C"), Some((5, 6)));
        assert_eq!(schedule.makespan(), 6);
        assert_eq!(schedule.critical_path, vec!["A", "B", "C"]);
        assert!(schedule.tasks.iter().all(|t| t.is_on_critical_path && t.slack == 0));
        assert_eq!(schedule.row_count, 1);
    }

    #[test]
    fn missing_estimates_use_default() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A"),
            Issue::new("B", "B").depends_on("A"),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(span(&schedule, "B"), Some((3, 6)));
    }

    #[test]
    fn huge_bounds_saturate_instead_of_wrapping() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(days(1, 2, 3_000_000_000)),
            Issue::new("B", "B")
                .with_estimate(days(1, 2, 3_000_000_000))
                .depends_on("A"),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(schedule.totals.max_days, u32::MAX);
        assert_eq!(schedule.totals.expected_days, 4);
        assert_eq!(schedule.totals.min_days, 2);
    }

    #[test]
    fn saturated_expected_span_still_schedules() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(DurationEstimate::fixed(u32::MAX)),
            Issue::new("B", "B")
                .with_estimate(DurationEstimate::fixed(5))
                .depends_on("A"),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(span(&schedule, "B"), Some((u32::MAX, u32::MAX)));
        assert_eq!(schedule.makespan(), u32::MAX);
    }

    #[test]
    fn provider_estimates_override_issue_estimates() {
        let mut estimates = EstimateSet::default();
        estimates
            .estimates
            .insert("B".to_string(), DurationEstimate::fixed(10));
        let schedule = compute_schedule(&chain_2_3_1(), &estimates, &ScheduleConfig::default());
        assert_eq!(span(&schedule, "B"), Some((2, 12)));
        assert_eq!(schedule.makespan(), 13);
    }

    #[test]
    fn closed_prerequisites_count_as_done() {
        let mut graph = chain_2_3_1();
        graph.set_status("A", Status::Closed).unwrap();

        let schedule = schedule_of(&graph);
        assert!(schedule.task("A").is_none());
        assert_eq!(span(&schedule, "B"), Some((0, 3)));

        let config = ScheduleConfig {
            include_closed: true,
            ..ScheduleConfig::default()
        };
        let all = compute_schedule(&graph, &EstimateSet::default(), &config);
        assert_eq!(span(&all, "B"), Some((2, 5)));
    }

    #[test]
    fn totals_use_each_bound_independently() {
        // The longest chain differs per bound.
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(days(1, 1, 10)),
            Issue::new("B", "B").with_estimate(days(5, 5, 5)),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(
            schedule.totals,
            PlanTotals {
                min_days: 5,
                expected_days: 5,
                max_days: 10,
            }
        );
    }

    #[test]
    fn empty_graph_schedules_nothing() {
        let schedule = compute_schedule(
            &GraphEngine::new(),
            &EstimateSet::default(),
            &ScheduleConfig::default(),
        );
        assert!(schedule.tasks.is_empty());
        assert!(schedule.critical_path.is_empty());
        assert_eq!(schedule.row_count, 0);
        assert_eq!(schedule.totals, PlanTotals::default());
    }

    #[test]
    fn cyclic_input_still_schedules_every_task() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").depends_on("B"),
            Issue::new("B", "B").depends_on("A"),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(schedule.tasks.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Critical path and lanes
    // -----------------------------------------------------------------------

    fn diamond() -> GraphEngine {
        GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(DurationEstimate::fixed(2)),
            Issue::new("B", "B")
                .with_estimate(DurationEstimate::fixed(3))
                .depends_on("A"),
            Issue::new("C", "C")
                .with_estimate(DurationEstimate::fixed(1))
                .depends_on("A"),
            Issue::new("D", "D")
                .with_estimate(DurationEstimate::fixed(1))
                .depends_on("B")
                .depends_on("C"),
        ])
    }

    #[test]
    fn short_branch_has_slack() {
        let schedule = schedule_of(&diamond());
        assert_eq!(schedule.makespan(), 6);
        assert_eq!(schedule.critical_path, vec!["A", "B", "D"]);

        let c = schedule.task("C").map(|t| (t.is_on_critical_path, t.slack));
        assert_eq!(c, Some((false, 2)));
        let d = schedule.task("D").map(|t| (t.start_day, t.is_on_critical_path));
        assert_eq!(d, Some((5, true)));
    }

    #[test]
    fn parallel_work_gets_its_own_row() {
        let schedule = schedule_of(&diamond());
        let rows: Vec<(String, usize)> = schedule
            .tasks
            .iter()
            .map(|t| (t.id.clone(), t.row))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A".to_string(), 0),
                ("B".to_string(), 0),
                ("C".to_string(), 1),
                ("D".to_string(), 0),
            ]
        );
        assert_eq!(schedule.row_count, 2);
    }

    #[test]
    fn zero_length_tasks_share_a_row() {
        let graph = GraphEngine::from_issues([
            Issue::new("A", "A").with_estimate(DurationEstimate::fixed(4)),
            Issue::new("M", "milestone").with_estimate(DurationEstimate::fixed(0)),
        ]);
        let schedule = schedule_of(&graph);
        assert_eq!(schedule.task("M").map(|t| t.row), Some(0));
        assert_eq!(schedule.row_count, 1);
    }

    #[test]
    fn asserted_path_is_checked_not_adopted() {
        let estimates = EstimateSet {
            estimates: HashMap::new(),
            critical_path: Some(vec!["A".to_string(), "X".to_string()]),
        };
        let schedule = compute_schedule(&chain_2_3_1(), &estimates, &ScheduleConfig::default());
        assert_eq!(schedule.critical_path, vec!["A", "B", "C"]);
        assert_eq!(
            schedule.critical_path_check,
            Some(CriticalPathCheck {
                agrees: false,
                missing: vec!["B".to_string(), "C".to_string()],
                unexpected: vec!["X".to_string()],
            })
        );
    }

    #[test]
    fn matching_assertion_agrees() {
        let estimates = EstimateSet {
            estimates: HashMap::new(),
            critical_path: Some(vec!["C".to_string(), "B".to_string(), "A".to_string()]),
        };
        let schedule = compute_schedule(&chain_2_3_1(), &estimates, &ScheduleConfig::default());
        assert_eq!(schedule.critical_path_check.map(|c| c.agrees), Some(true));
    }
}
