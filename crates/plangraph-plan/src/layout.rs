//! Layered drawing of the dependency graph.
//!
//! # Algorithm
//!
//! 1. **Layering**: an issue with no in-graph prerequisites sits in layer 0;
//!    otherwise one layer right of its deepest prerequisite. Computed with an
//!    explicit work stack and memoised. A prerequisite that is still on the
//!    stack (only possible on corrupted, cyclic input) counts as layer 0.
//! 2. **Ordering**: each layer starts sorted by priority (ties by arena
//!    order), then `barycenter_iterations` rounds of a forward sweep (mean
//!    rank of prerequisites in the previous layer) and a backward sweep (mean
//!    rank of dependents in the next layer).
//! 3. **Coordinates**: fixed-width columns; nodes stacked top to bottom with
//!    a height that grows with their description.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss
)]

use std::collections::HashMap;

use plangraph_core::GraphEngine;
use plangraph_core::config::LayoutConfig;
use plangraph_core::model::Issue;
use serde::Serialize;
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where one issue is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    /// Column index, 0 for issues with no prerequisites.
    pub layer: usize,
    /// Rank within the column, 0 at the top.
    pub order: usize,
}

/// Result of [`compute_layout`]. Positions are sorted by layer, then order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub positions: Vec<NodePosition>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn position(&self, id: &str) -> Option<&NodePosition> {
        self.positions.iter().find(|p| p.id == id)
    }

    /// Ids per layer, each in rank order.
    pub fn layers(&self) -> Vec<Vec<&str>> {
        let mut layers: Vec<Vec<&str>> = Vec::new();
        for position in &self.positions {
            if layers.len() <= position.layer {
                layers.resize_with(position.layer + 1, Vec::new);
            }
            layers[position.layer].push(position.id.as_str());
        }
        layers
    }

    /// Edges whose two ends are both drawn, as `(dependent, prerequisite)`.
    pub fn edges<'g>(&self, graph: &'g GraphEngine) -> Vec<(&'g str, &'g str)> {
        graph
            .edges()
            .into_iter()
            .filter(|(dependent, prerequisite)| {
                self.position(dependent).is_some() && self.position(prerequisite).is_some()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Lay out every issue of `graph` (closed ones only if
/// `config.include_closed`).
#[instrument(skip_all, fields(issues = graph.len()))]
pub fn compute_layout(graph: &GraphEngine, config: &LayoutConfig) -> Layout {
    let nodes: Vec<&Issue> = graph
        .issues()
        .iter()
        .filter(|issue| config.include_closed || issue.is_open())
        .collect();

    if nodes.is_empty() {
        return Layout {
            positions: Vec::new(),
            width: 2.0 * config.padding,
            height: 2.0 * config.padding,
        };
    }

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
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (dependent, prereqs) in prerequisites.iter().enumerate() {
        for &p in prereqs {
            dependents[p].push(dependent);
        }
    }

    let layer = assign_layers(&prerequisites);
    let mut columns = initial_columns(&nodes, &layer);
    order_columns(
        &mut columns,
        &layer,
        &prerequisites,
        &dependents,
        config.barycenter_iterations,
    );

    let (positions, tallest) = place(&nodes, &columns, config);
    let column_count = columns.len() as f64;
    let width = 2.0f64.mul_add(
        config.padding,
        column_count.mul_add(config.node_width, (column_count - 1.0) * config.horizontal_gap),
    );
    let height = 2.0f64.mul_add(config.padding, tallest);

    debug!(
        layers = columns.len(),
        nodes = positions.len(),
        width,
        height,
        "layout computed"
    );

    Layout {
        positions,
        width,
        height,
    }
}

// ---------------------------------------------------------------------------
// Layering
// ---------------------------------------------------------------------------

struct Frame {
    node: usize,
    next: usize,
    deepest: Option<usize>,
}

impl Frame {
    const fn new(node: usize) -> Self {
        Self {
            node,
            next: 0,
            deepest: None,
        }
    }

    fn observe(&mut self, layer: usize) {
        self.deepest = Some(self.deepest.map_or(layer, |d| d.max(layer)));
    }
}

/// Longest-path layering over in-graph prerequisites, without recursion.
fn assign_layers(prerequisites: &[Vec<usize>]) -> Vec<usize> {
    let mut layer: Vec<Option<usize>> = vec![None; prerequisites.len()];
    let mut on_stack = vec![false; prerequisites.len()];

    for root in 0..prerequisites.len() {
        if layer[root].is_some() {
            continue;
        }
        on_stack[root] = true;
        let mut stack = vec![Frame::new(root)];

        while let Some(frame) = stack.last_mut() {
            if let Some(&p) = prerequisites[frame.node].get(frame.next) {
                frame.next += 1;
                if let Some(known) = layer[p] {
                    frame.observe(known);
                } else if on_stack[p] {
                    frame.observe(0);
                } else {
                    on_stack[p] = true;
                    stack.push(Frame::new(p));
                }
            } else {
                let done = frame.node;
                let assigned = frame.deepest.map_or(0, |d| d + 1);
                layer[done] = Some(assigned);
                on_stack[done] = false;
                stack.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.observe(assigned);
                }
            }
        }
    }

    layer.into_iter().map(Option::unwrap_or_default).collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn initial_columns(nodes: &[&Issue], layer: &[usize]) -> Vec<Vec<usize>> {
    let depth = layer.iter().copied().max().unwrap_or(0) + 1;
    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (i, &l) in layer.iter().enumerate() {
        columns[l].push(i);
    }
    for column in &mut columns {
        column.sort_by_key(|&i| nodes[i].priority);
    }
    columns
}

fn order_columns(
    columns: &mut [Vec<usize>],
    layer: &[usize],
    prerequisites: &[Vec<usize>],
    dependents: &[Vec<usize>],
    iterations: usize,
) {
    let mut rank = vec![0usize; layer.len()];
    for column in columns.iter() {
        for (r, &node) in column.iter().enumerate() {
            rank[node] = r;
        }
    }

    let last = columns.len() - 1;
    for _ in 0..iterations {
        for l in 1..=last {
            sweep(&mut columns[l], &mut rank, layer, prerequisites, l - 1);
        }
        for l in (0..last).rev() {
            sweep(&mut columns[l], &mut rank, layer, dependents, l + 1);
        }
    }
}

/// Reorder one column by the mean rank of each node's neighbours in
/// `neighbour_layer`. Nodes without such neighbours keep their current rank.
fn sweep(
    column: &mut [usize],
    rank: &mut [usize],
    layer: &[usize],
    neighbours: &[Vec<usize>],
    neighbour_layer: usize,
) {
    let mut targets: Vec<(usize, f64)> = column
        .iter()
        .map(|&node| {
            let ranks: Vec<usize> = neighbours[node]
                .iter()
                .filter(|&&n| layer[n] == neighbour_layer)
                .map(|&n| rank[n])
                .collect();
            let target = if ranks.is_empty() {
                rank[node] as f64
            } else {
                ranks.iter().sum::<usize>() as f64 / ranks.len() as f64
            };
            (node, target)
        })
        .collect();

    targets.sort_by(|a, b| a.1.total_cmp(&b.1));
    for (r, (node, _)) in targets.into_iter().enumerate() {
        column[r] = node;
        rank[node] = r;
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Drawn height of one issue card.
pub fn node_height(issue: &Issue, config: &LayoutConfig) -> f64 {
    let chars = issue
        .description
        .as_deref()
        .map_or(0, |text| text.chars().count());
    let lines = chars
        .div_ceil(config.chars_per_line.max(1))
        .min(config.max_description_lines);
    (lines as f64).mul_add(config.line_height, config.header_height)
}

/// Positions in layer/rank order, plus the tallest column height.
fn place(
    nodes: &[&Issue],
    columns: &[Vec<usize>],
    config: &LayoutConfig,
) -> (Vec<NodePosition>, f64) {
    let mut positions = Vec::with_capacity(nodes.len());
    let mut tallest = 0.0f64;

    for (l, column) in columns.iter().enumerate() {
        let x = (l as f64).mul_add(config.node_width + config.horizontal_gap, config.padding);
        let mut y = config.padding;
        for (order, &node) in column.iter().enumerate() {
            let height = node_height(nodes[node], config);
            positions.push(NodePosition {
                id: nodes[node].id.clone(),
                x,
                y,
                height,
                layer: l,
                order,
            });
            y += height + config.vertical_gap;
        }
        if !column.is_empty() {
            tallest = tallest.max(y - config.vertical_gap - config.padding);
        }
    }

    (positions, tallest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
