// src/resolver/graph.rs

//! Diagnostic graph built during resolution
//!
//! Nodes are the concrete `name:version` pairs visited while traversing the
//! store, edges point from a dependant to each of its dependencies. A graph is
//! rebuilt from scratch on every resolution call.

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Handle to a node of a [`ResolutionGraph`]
pub type NodeId = NodeIndex;

/// A visited package version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphNode {
    pub name: String,
    pub version: String,
    /// True iff this version is the one chosen for its name
    pub selected: bool,
}

impl GraphNode {
    /// Graph key: `name:version`
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// Label used when rendering: `{NAME:name, VERSION:version}`
    pub fn label(&self) -> String {
        format!("{{NAME:{}, VERSION:{}}}", self.name, self.version)
    }
}

/// Dependency graph of every candidate visited during one resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionGraph {
    graph: DiGraph<GraphNode, ()>,
    /// Map from `name:version` to its node
    index: HashMap<String, NodeId>,
}

impl ResolutionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the node for `name:version`, inserting it if needed
    pub fn ensure_node(&mut self, name: &str, version: &str) -> NodeId {
        let key = format!("{name}:{version}");
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = self.graph.add_node(GraphNode {
            name: name.to_string(),
            version: version.to_string(),
            selected: false,
        });
        self.index.insert(key, id);
        id
    }

    /// Record a dependant -> dependency edge; duplicates collapse
    pub fn add_edge(&mut self, dependant: NodeId, dependency: NodeId) {
        if self.graph.find_edge(dependant, dependency).is_none() {
            self.graph.add_edge(dependant, dependency, ());
        }
    }

    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    /// Get a node by its `name:version` key
    pub fn node(&self, key: &str) -> Option<&GraphNode> {
        self.node_id(key).and_then(|id| self.graph.node_weight(id))
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(id)
    }

    /// Mark `id` as the chosen version for its name, unselecting its siblings
    pub(crate) fn mark_selected(&mut self, id: NodeId) {
        let Some(name) = self.graph.node_weight(id).map(|n| n.name.clone()) else {
            return;
        };
        for node in self.graph.node_weights_mut() {
            if node.name == name {
                node.selected = false;
            }
        }
        if let Some(node) = self.graph.node_weight_mut(id) {
            node.selected = true;
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(|id| &self.graph[id])
    }

    /// All edges as (dependant, dependency) pairs
    pub fn edges(&self) -> impl Iterator<Item = (&GraphNode, &GraphNode)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()]))
    }

    /// Nodes marked as the chosen version of their name
    pub fn selected(&self) -> Vec<&GraphNode> {
        self.nodes().filter(|n| n.selected).collect()
    }

    /// Every visited version of `name`, in discovery order
    pub fn versions_of(&self, name: &str) -> Vec<&str> {
        self.nodes()
            .filter(|n| n.name == name)
            .map(|n| n.version.as_str())
            .collect()
    }

    /// Direct dependencies of the node `key`
    pub fn dependencies_of(&self, key: &str) -> Vec<&GraphNode> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Nodes that depend directly on the node `key`
    pub fn dependants_of(&self, key: &str) -> Vec<&GraphNode> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Whether the visited dependency chains contain a cycle
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    fn neighbors(&self, key: &str, direction: Direction) -> Vec<&GraphNode> {
        let Some(id) = self.node_id(key) else {
            return Vec::new();
        };
        let mut nodes: Vec<&GraphNode> = self
            .graph
            .neighbors_directed(id, direction)
            .map(|n| &self.graph[n])
            .collect();
        nodes.sort_by_key(|n| n.label());
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_node_is_idempotent() {
        let mut graph = ResolutionGraph::new();
        let a = graph.ensure_node("A", "1");
        let again = graph.ensure_node("A", "1");
        let other = graph.ensure_node("A", "2");

        assert_eq!(a, again);
        assert_ne!(a, other);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.versions_of("A"), vec!["1", "2"]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = ResolutionGraph::new();
        let a = graph.ensure_node("A", "1");
        let b = graph.ensure_node("B", "1");
        graph.add_edge(a, b);
        graph.add_edge(a, b);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies_of("A:1")[0].key(), "B:1");
        assert_eq!(graph.dependants_of("B:1")[0].key(), "A:1");
        assert!(graph.dependencies_of("missing:0").is_empty());
    }

    #[test]
    fn test_selection_is_unique_per_name() {
        let mut graph = ResolutionGraph::new();
        let d1 = graph.ensure_node("D", "1");
        let d2 = graph.ensure_node("D", "2");
        let c = graph.ensure_node("C", "1");

        graph.mark_selected(d1);
        graph.mark_selected(c);
        graph.mark_selected(d2);

        let selected: Vec<String> = graph.selected().iter().map(|n| n.key()).collect();
        assert_eq!(selected, vec!["D:2", "C:1"]);
        assert!(!graph.node("D:1").unwrap().selected);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = ResolutionGraph::new();
        let a = graph.ensure_node("A", "1");
        let b = graph.ensure_node("B", "1");
        graph.add_edge(a, b);
        assert!(!graph.has_cycle());

        graph.add_edge(b, a);
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_label() {
        let mut graph = ResolutionGraph::new();
        graph.ensure_node("DEP-1", "0.1.0");
        assert_eq!(graph.node("DEP-1:0.1.0").unwrap().label(), "{NAME:DEP-1, VERSION:0.1.0}");
    }
}
