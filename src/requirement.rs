// src/requirement.rs

//! Requirement - a request for a package by name and version constraint

use crate::error::{Error, Result};
use crate::resolver::NodeId;
use crate::version::VersionConstraint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A request for a package by name and version constraint
///
/// Document form: `{"NAME": "openssl", "VERSION": "3.0"}` or
/// `{"NAME": "openssl", "VERSION": {"$gte": "3.0", "$lte": "3.9"}}`.
/// A missing VERSION accepts any stored version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "VERSION", default, skip_serializing_if = "VersionConstraint::is_any")]
    pub constraint: VersionConstraint,
    /// Graph node of the candidate that declared this requirement.
    /// Diagnostics only; `None` for root requests.
    #[serde(skip)]
    pub parent: Option<NodeId>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
            parent: None,
        }
    }

    /// Requirement pinned to one exact version
    pub fn exact(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, VersionConstraint::exact(version))
    }

    /// Requirement accepting any stored version
    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, VersionConstraint::Any)
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Parse a requirement document, rejecting an empty NAME
    pub fn from_document(doc: &serde_json::Value) -> Result<Self> {
        let requirement: Self = serde_json::from_value(doc.clone())
            .map_err(|e| Error::invalid_metadata(format!("bad requirement {doc}: {e}")))?;
        requirement.validate()?;
        Ok(requirement)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_metadata("requirement NAME is empty"));
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Check if a stored version satisfies this requirement
    pub fn matches_candidate(&self, version: &str) -> bool {
        self.constraint.matches(version)
    }

    /// Same name, but no single version can satisfy both
    pub fn is_alternative_of(&self, other: &Requirement) -> bool {
        self.name == other.name && !self.constraint.is_compatible_with(&other.constraint)
    }

    /// Strict identity: same name and same constraint
    pub fn perfect_match(&self, other: &Requirement) -> bool {
        self == other
    }
}

// Parent links are diagnostics, not identity.
impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.constraint == other.constraint
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.constraint.hash(state);
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;
    use serde_json::json;

    #[test]
    fn test_equality_ignores_parent() {
        let a = Requirement::exact("DEP-1", "0.1.0");
        let b = Requirement::exact("DEP-1", "0.1.0").with_parent(NodeIndex::new(3));
        assert_eq!(a, b);
        assert!(a.perfect_match(&b));
        assert_eq!(a.matches_candidate("0.1.0"), b.matches_candidate("0.1.0"));
        assert_eq!(a.matches_candidate("0.2.0"), b.matches_candidate("0.2.0"));
    }

    #[test]
    fn test_alternatives() {
        let a = Requirement::exact("DEP-1", "0.1.0");
        let b = Requirement::exact("DEP-1", "0.2.0");
        let range = Requirement::new("DEP-1", VersionConstraint::range(Some("0.1"), None));

        assert!(a.is_alternative_of(&b));
        assert!(!a.is_alternative_of(&range));
        assert!(!a.is_alternative_of(&Requirement::exact("DEP-2", "0.2.0")));
    }

    #[test]
    fn test_from_document() {
        let r = Requirement::from_document(&json!({"NAME": "B", "VERSION": "1"})).unwrap();
        assert_eq!(r, Requirement::exact("B", "1"));
        assert!(r.is_root());

        let r = Requirement::from_document(&json!({"NAME": "D"})).unwrap();
        assert_eq!(r.constraint, VersionConstraint::Any);

        let r = Requirement::from_document(
            &json!({"NAME": "D", "VERSION": {"$gte": "1", "$lte": "2"}}),
        )
        .unwrap();
        assert!(r.matches_candidate("1"));
        assert!(r.matches_candidate("2"));
        assert!(!r.matches_candidate("3"));

        assert!(Requirement::from_document(&json!({"VERSION": "1"})).is_err());
        assert!(Requirement::from_document(&json!({"NAME": "", "VERSION": "1"})).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Requirement::exact("B", "1").to_string(), "B = 1");
        assert_eq!(Requirement::any("B").to_string(), "B *");
    }
}
