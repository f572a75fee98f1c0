// src/resolver/selection.rs

//! Tie-break between equally valid alternative versions

use crate::metadata::Candidate;
use serde::{Deserialize, Serialize};

/// Policy choosing one version when several satisfy every constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// First viable candidate in repository order
    #[default]
    #[serde(rename = "first")]
    FirstReturned,
    /// Lexicographically greatest viable version
    #[serde(rename = "highest")]
    HighestVersion,
}

impl SelectionPolicy {
    /// Order `viable` from most to least preferred
    pub fn rank<'c>(&self, viable: &[&'c Candidate]) -> Vec<&'c Candidate> {
        let mut ranked = viable.to_vec();
        if *self == SelectionPolicy::HighestVersion {
            // Stable, so equal versions keep repository order
            ranked.sort_by(|a, b| b.version().cmp(a.version()));
        }
        ranked
    }

    /// Pick one of `viable`, or `None` if it is empty
    pub fn select_alternative<'c>(&self, viable: &[&'c Candidate]) -> Option<&'c Candidate> {
        self.rank(viable).into_iter().next()
    }
}
