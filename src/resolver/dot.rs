// src/resolver/dot.rs

//! DOT rendering of resolution graphs
//!
//! Output is sorted by label so the same graph always renders to the same
//! bytes. Selected nodes carry `color=blue`.

use super::graph::{GraphNode, ResolutionGraph};
use std::fmt::Write;

/// Render a resolution graph as a DOT digraph
pub fn to_dot(graph: &ResolutionGraph) -> String {
    let mut nodes: Vec<&GraphNode> = graph.nodes().collect();
    nodes.sort_by_key(|n| n.label());

    let mut edges: Vec<(String, String)> = graph
        .edges()
        .map(|(from, to)| (from.label(), to.label()))
        .collect();
    edges.sort();

    let mut out = String::from("digraph {\n");

    for node in nodes {
        let color = if node.selected { "color=blue " } else { "" };
        // Writing into a String cannot fail
        let _ = writeln!(out, "\"{}\" [penwidth=3 {}];", escape(&node.label()), color);
    }

    for (from, to) in edges {
        let _ = writeln!(
            out,
            "\"{}\" -> \"{}\"[color=black penwidth=3];",
            escape(&from),
            escape(&to)
        );
    }

    out.push_str("}\n");
    out
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
