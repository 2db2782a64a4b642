//! Property-based tests for reference cycle detection
//!
//! For any graph containing a two-file cycle the detector reports a cycle
//! holding both files; for any graph whose edges only point "forward" it
//! reports nothing.

use proptest::prelude::*;
use std::fs;
use strata_config::validation::find_cycles;
use strata_config::{ConfigValidator, ErrorKind, ReferenceGraph, ValidatorSettings};
use tempfile::TempDir;

/// Node names `n0..nN`
fn node(i: usize) -> String {
    format!("n{}", i)
}

/// Edges among `size` nodes, possibly cyclic
fn edges_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..8).prop_flat_map(|size| {
        (
            Just(size),
            prop::collection::vec((0..size, 0..size), 0..16),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Adding a -> b and b -> a to any graph yields a cycle with both nodes
    #[test]
    fn prop_two_node_cycle_detected(
        (size, edges) in edges_strategy(),
        a in 0usize..8,
        b in 0usize..8,
    ) {
        let a = a % size;
        let b = b % size;
        prop_assume!(a != b);

        let mut graph = ReferenceGraph::new();
        for (from, to) in &edges {
            graph.add_edge(node(*from), node(*to));
        }
        graph.add_edge(node(a), node(b));
        graph.add_edge(node(b), node(a));

        let cycles = find_cycles(&graph);
        prop_assert!(
            cycles.iter().any(|c| c.contains(&node(a)) && c.contains(&node(b))),
            "no cycle through {} and {} in {:?}",
            node(a),
            node(b),
            cycles
        );
    }

    /// Graphs whose edges only go from lower to higher index are acyclic
    #[test]
    fn prop_forward_edges_never_cycle((size, edges) in edges_strategy()) {
        let mut graph = ReferenceGraph::new();
        for i in 0..size {
            graph.add_node(node(i));
        }
        for (from, to) in edges {
            if from < to {
                graph.add_edge(node(from), node(to));
            }
        }
        prop_assert!(find_cycles(&graph).is_empty());
    }

    /// Every reported cycle is closed and follows real edges
    #[test]
    fn prop_cycles_follow_edges((_, edges) in edges_strategy()) {
        let mut graph = ReferenceGraph::new();
        for (from, to) in &edges {
            graph.add_edge(node(*from), node(*to));
        }

        for cycle in find_cycles(&graph) {
            prop_assert!(cycle.len() >= 2);
            prop_assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                prop_assert!(graph.references(&pair[0]).any(|t| t == pair[1]));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    /// Two profiles listing each other produce exactly one cycle error
    #[test]
    fn prop_mutual_profiles_report_one_cycle(
        first in "[a-m][a-z]{0,6}",
        second in "[n-z][a-z]{0,6}",
    ) {
        let dir = TempDir::new().expect("temp dir");
        let first_file = format!("{}.yaml", first);
        let second_file = format!("{}.yaml", second);
        fs::write(
            dir.path().join(&first_file),
            format!("name: {}\ncontexts: [{}]\n", first, second_file),
        ).expect("write first");
        fs::write(
            dir.path().join(&second_file),
            format!("name: {}\ncontexts: [{}]\n", second, first_file),
        ).expect("write second");

        let validator = ConfigValidator::with_settings(dir.path(), ValidatorSettings::default());
        let report = validator.validate_all(dir.path());

        let cycles = report.of_kind(ErrorKind::CircularDependency);
        prop_assert_eq!(cycles.len(), 1);
        prop_assert!(cycles[0].file_path.contains(&first_file));
        prop_assert!(cycles[0].file_path.contains(&second_file));
    }
}
