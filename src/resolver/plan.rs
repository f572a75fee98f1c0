// src/resolver/plan.rs

//! Resolution plan data structures
//!
//! Contains the result types for dependency resolution.

use super::graph::ResolutionGraph;
use crate::metadata::Candidate;

/// Result of a successful resolution
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    /// Chosen candidates, one per name, in resolution order (roots first)
    pub resolved: Vec<Candidate>,
    /// Every candidate visited, with the chosen ones marked selected
    pub graph: ResolutionGraph,
}

impl ResolutionPlan {
    /// Chosen version for `name`, if it was part of the traversal
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.resolved
            .iter()
            .find(|c| c.name() == name)
            .map(Candidate::version)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
