// src/packager/mod.rs

//! Packing files into payloads and unpacking them again
//!
//! Instructions are glob-based copy directives. A box instruction copies
//! files from a directory into the payload, an unbox instruction extracts
//! payload files into a destination directory.

mod archive;

pub use archive::TarPackager;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_filter() -> String {
    "*".to_string()
}

/// Copy files matching `filter` from `from` into the payload under `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxInstruction {
    /// Source directory; empty means the current directory
    #[serde(rename = "FROM", alias = "from", default)]
    pub from: PathBuf,
    /// Payload-relative destination
    #[serde(rename = "TO", alias = "to", default)]
    pub to: PathBuf,
    /// Glob matched against the path relative to `from`
    #[serde(rename = "FILTER", alias = "filter", default = "default_filter")]
    pub filter: String,
}

impl BoxInstruction {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, filter: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            filter: filter.into(),
        }
    }
}

/// Extract payload files under `from` matching `filter` into `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboxInstruction {
    /// Payload-relative source; empty means the whole payload
    #[serde(rename = "FROM", alias = "from", default)]
    pub from: PathBuf,
    /// Destination directory on disk
    #[serde(rename = "TO", alias = "to", default)]
    pub to: PathBuf,
    /// Glob matched against the path relative to `from`
    #[serde(rename = "FILTER", alias = "filter", default = "default_filter")]
    pub filter: String,
}

impl UnboxInstruction {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>, filter: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            filter: filter.into(),
        }
    }
}

/// Builds payloads from the filesystem and writes them back out
pub trait Packager: Send + Sync {
    /// Produce a payload holding every file the instructions select
    fn box_files(&self, instructions: &[BoxInstruction]) -> Result<Vec<u8>>;

    /// Write the selected payload files to disk, returning the created paths
    fn unbox(&self, payload: &[u8], instructions: &[UnboxInstruction]) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instruction_documents() {
        let parsed: Vec<UnboxInstruction> = serde_json::from_value(json!([
            {"FROM": "bin", "TO": "/opt/app", "FILTER": "*.sh"},
            {"from": "", "to": "out"}
        ]))
        .unwrap();

        assert_eq!(parsed[0], UnboxInstruction::new("bin", "/opt/app", "*.sh"));
        assert_eq!(parsed[1].filter, "*");
        assert_eq!(parsed[1].from, PathBuf::new());
    }
}
