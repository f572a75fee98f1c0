// src/resolver/mod.rs

//! Dependency resolution and conflict detection
//!
//! This module provides breadth-first candidate discovery, alternative
//! selection, conflict reporting and the diagnostic graph with its DOT
//! rendering.

mod conflict;
mod dot;
mod engine;
mod graph;
mod plan;
mod selection;

pub use conflict::{Conflict, ROOT_REQUIRER};
pub use dot::to_dot;
pub use engine::{Resolver, discover};
pub use graph::{GraphNode, NodeId, ResolutionGraph};
pub use plan::ResolutionPlan;
pub use selection::SelectionPolicy;
