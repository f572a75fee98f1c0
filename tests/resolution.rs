// tests/resolution.rs

//! Resolution behaviour against a real on-disk bag.

mod common;

use bagman::{Error, Requirement, SilentObserver, to_dot};
use common::{TestBag, chain_bag, pkg};
use std::collections::HashSet;

#[test]
fn test_resolved_set_has_one_entry_per_name() {
    let test = chain_bag();
    let plan = test
        .bag
        .discover(&[Requirement::exact("B", "1"), Requirement::any("D")], &SilentObserver)
        .unwrap();

    let names: Vec<_> = plan.resolved.iter().map(|c| c.name()).collect();
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(names.len(), unique.len());
    assert_eq!(names.len(), 3);
}

#[test]
fn test_unambiguous_graph_matches_resolved_set() {
    let test = TestBag::new();
    test.charge(pkg("libz", "1.3"));
    test.charge(pkg("libssl", "3.0").with_dependency(Requirement::exact("libz", "1.3")));
    test.charge(
        pkg("curl", "8.5")
            .with_dependency(Requirement::exact("libssl", "3.0"))
            .with_dependency(Requirement::any("libz")),
    );

    let plan = test
        .bag
        .discover(&[Requirement::any("curl")], &SilentObserver)
        .unwrap();

    assert_eq!(plan.graph.node_count(), plan.len());
    assert_eq!(plan.graph.selected().len(), 3);
    assert_eq!(plan.graph.edge_count(), 3);
}

#[test]
fn test_disjoint_transitive_pins_conflict() {
    let test = TestBag::new();
    test.charge(pkg("DEP-1", "0.1.0"));
    test.charge(pkg("DEP-1", "0.2.0"));
    test.charge(pkg("A", "1").with_dependency(Requirement::exact("DEP-1", "0.1.0")));
    test.charge(pkg("B", "1").with_dependency(Requirement::exact("DEP-1", "0.2.0")));

    let err = test
        .bag
        .discover(&[Requirement::any("A"), Requirement::any("B")], &SilentObserver)
        .unwrap_err();

    assert!(matches!(err, Error::ImpossibleConfiguration { .. }));
    let graph = err.graph().unwrap();
    assert!(graph.selected().is_empty());
    assert!(!to_dot(graph).contains("color=blue"));
    assert!(err.to_string().contains("DEP-1"));
}

#[test]
fn test_cycle_yields_one_node_per_version() {
    let test = TestBag::new();
    test.charge(pkg("A", "1").with_dependency(Requirement::exact("B", "1")));
    test.charge(pkg("B", "1").with_dependency(Requirement::exact("A", "1")));

    let plan = test
        .bag
        .discover(&[Requirement::exact("A", "1")], &SilentObserver)
        .unwrap();

    assert_eq!(plan.graph.node_count(), 2);
    assert_eq!(plan.len(), 2);
    assert!(plan.graph.has_cycle());
}

#[test]
fn test_missing_transitive_dependency_keeps_partial_graph() {
    let test = TestBag::new();
    test.charge(pkg("app", "1").with_dependency(Requirement::any("ghost")));

    let err = test
        .bag
        .discover(&[Requirement::any("app")], &SilentObserver)
        .unwrap_err();

    assert!(err.is_not_found());
    let dot = to_dot(err.graph().unwrap());
    assert!(dot.contains("{NAME:app, VERSION:1}"));
}

#[test]
fn test_dot_output_is_stable() {
    let test = chain_bag();
    let plan = test
        .bag
        .discover(&[Requirement::exact("B", "1")], &SilentObserver)
        .unwrap();

    let first = to_dot(&plan.graph);
    let second = to_dot(&plan.graph);
    assert_eq!(first, second);
    assert!(first.starts_with("digraph {\n"));
    assert_eq!(first.matches("color=blue").count(), 3);
    assert_eq!(first.matches("->").count(), 3);
}

#[test]
fn test_requirements_for_lists_direct_dependencies() {
    let test = chain_bag();
    let deps = test.bag.requirements_for(&Requirement::exact("B", "1")).unwrap();
    assert_eq!(deps, vec![Requirement::exact("C", "1")]);
}
