use plangraph_core::graph::{find_all_cycles, find_redundant_edges, remove_redundant_edges};
use plangraph_core::{GraphEngine, GraphError, Issue};
use proptest::prelude::*;

use generators::*;

fn chain() -> GraphEngine {
    GraphEngine::from_issues([
        Issue::new("A", "A"),
        Issue::new("B", "B").depends_on("A"),
        Issue::new("C", "C").depends_on("B"),
    ])
}

// ---------------------------------------------------------------------------
// Known topologies
// ---------------------------------------------------------------------------

#[test]
fn closing_a_chain_into_a_loop_is_rejected() {
    let mut graph = chain();
    let hash = graph.content_hash();

    let err = graph.add_dependency("A", "C").unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }), "got {err:?}");
    assert!(graph.dependencies("A").is_empty());
    assert_eq!(graph.content_hash(), hash);
}

#[test]
fn redundant_shortcut_is_reported_and_reduced() {
    let mut graph = chain();
    graph.add_dependency("C", "A").unwrap();

    let redundant = find_redundant_edges(&graph);
    assert_eq!(redundant.len(), 1);
    assert_eq!(redundant[0].dependent, "C");
    assert_eq!(redundant[0].prerequisite, "A");
    assert_eq!(redundant[0].through, "B");

    assert_eq!(remove_redundant_edges(&mut graph), 1);
    assert_eq!(graph.dependencies("C"), ["B".to_string()]);
    assert!(graph.transitive_dependencies("C").contains("A"));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Any sequence of guarded adds on an empty edge set leaves a DAG.
    #[test]
    fn guarded_adds_never_create_cycles((n, pairs) in arb_edge_list(12)) {
        let mut graph = GraphEngine::from_issues(
            (0..n).map(|i| Issue::new(node_id(i), node_id(i))),
        );
        for (a, b) in pairs {
            let _ = graph.add_dependency(&node_id(a), &node_id(b));
        }
        prop_assert!(find_all_cycles(&graph).is_empty());
        for issue in graph.issues() {
            prop_assert!(!graph.transitive_dependencies(&issue.id).contains(&issue.id));
        }
    }

    /// An add is rejected exactly when the prerequisite already reaches the
    /// dependent, and a rejection leaves the edge set untouched.
    #[test]
    fn rejection_matches_reachability(
        (graph, a, b) in arb_dag(10).prop_flat_map(|g| {
            let n = g.len();
            (Just(g), 0..n, 0..n)
        })
    ) {
        let mut graph = graph;
        let (dependent, prerequisite) = (node_id(a), node_id(b));

        let expected_cycle = dependent == prerequisite
            || graph.transitive_dependencies(&prerequisite).contains(&dependent);
        let hash = graph.content_hash();

        match graph.add_dependency(&dependent, &prerequisite) {
            Ok(()) => {
                prop_assert!(!expected_cycle);
                prop_assert!(graph.dependencies(&dependent).contains(&prerequisite));
            }
            Err(GraphError::SelfReference(_)) => prop_assert_eq!(&dependent, &prerequisite),
            Err(GraphError::CycleDetected { path, .. }) => {
                prop_assert!(expected_cycle);
                prop_assert_eq!(path.first(), Some(&dependent));
                prop_assert_eq!(path.last(), Some(&dependent));
                prop_assert_eq!(graph.content_hash(), hash);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Transitive reduction keeps the closure on any input, cyclic or not.
    #[test]
    fn reduction_preserves_closure(graph in arb_raw_graph(10)) {
        let mut graph = graph;
        let before = graph.transitive_closure();
        remove_redundant_edges(&mut graph);
        prop_assert_eq!(graph.transitive_closure(), before);
    }

    #[test]
    fn reduction_is_idempotent(graph in arb_raw_graph(10)) {
        let mut graph = graph;
        remove_redundant_edges(&mut graph);
        let hash = graph.content_hash();
        prop_assert_eq!(remove_redundant_edges(&mut graph), 0);
        prop_assert!(find_redundant_edges(&graph).is_empty());
        prop_assert_eq!(graph.content_hash(), hash);
    }
}
