// src/error.rs

//! Error types for the bag
//!
//! Resolution failures always carry the diagnostic graph built up to the
//! point of failure, so callers can render it with
//! [`crate::resolver::to_dot`] without checking for its presence first.

use crate::resolver::{Conflict, ResolutionGraph};
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the bag, its repository and its packager
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error during file or payload operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid glob in a box/unbox filter
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Directory traversal failed while boxing
    #[error("directory walk failed: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// A metadata or request document has the wrong shape
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// An archive entry or instruction would escape its root directory
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    /// Stored payload does not match its content address
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Requested package has no stored version at all
    #[error("{name} is not in the bag")]
    NotInBag {
        name: String,
        graph: Box<ResolutionGraph>,
    },

    /// A dependency discovered during traversal has no stored version at all
    #[error("{name} (required by {required_by}) is not in the bag")]
    TransitiveDependencyUnreachable {
        name: String,
        required_by: String,
        graph: Box<ResolutionGraph>,
    },

    /// Stored versions exist but none satisfies every incoming constraint
    #[error("impossible configuration: {}", format_conflicts(.conflicts))]
    ImpossibleConfiguration {
        conflicts: Vec<Conflict>,
        graph: Box<ResolutionGraph>,
    },

    /// A package with identical metadata is already stored
    #[error("{name} {version} is yet in the bag")]
    YetInBag { name: String, version: String },
}

impl Error {
    /// Diagnostic graph attached to a resolution failure
    pub fn graph(&self) -> Option<&ResolutionGraph> {
        match self {
            Error::NotInBag { graph, .. }
            | Error::TransitiveDependencyUnreachable { graph, .. }
            | Error::ImpossibleConfiguration { graph, .. } => Some(&**graph),
            _ => None,
        }
    }

    /// Whether this error means the store lacks the requested artifact
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotInBag { .. } | Error::TransitiveDependencyUnreachable { .. }
        )
    }

    pub(crate) fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
