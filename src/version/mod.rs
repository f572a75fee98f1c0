// src/version/mod.rs

//! Version constraints for package requirements
//!
//! Versions are opaque strings. No semantic version parsing happens anywhere
//! in the bag: ordering is plain lexicographic string comparison, so "10" sorts
//! before "9". Constraints are limited to exact match and the two inclusive
//! range bounds used by metadata documents (`$gte`, `$lte`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version constraint carried by a requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "VersionDocument", into = "VersionDocument")]
pub enum VersionConstraint {
    /// Any version is acceptable
    #[default]
    Any,
    /// Exact version match
    Exact(String),
    /// Inclusive range; at least one bound is present
    Range {
        gte: Option<String>,
        lte: Option<String>,
    },
}

impl VersionConstraint {
    /// Exact-match constraint
    pub fn exact(version: impl Into<String>) -> Self {
        Self::Exact(version.into())
    }

    /// Range constraint; collapses to `Any` when both bounds are absent
    pub fn range(gte: Option<&str>, lte: Option<&str>) -> Self {
        match (gte, lte) {
            (None, None) => Self::Any,
            (gte, lte) => Self::Range {
                gte: gte.map(str::to_string),
                lte: lte.map(str::to_string),
            },
        }
    }

    /// Parse the textual form produced by `Display`
    ///
    /// Examples:
    /// - "*" or "" → Any
    /// - "= 1.0" or "1.0" → Exact("1.0")
    /// - ">= 1.0" → Range{gte: 1.0}
    /// - ">= 1.0, <= 2.0" → Range{gte: 1.0, lte: 2.0}
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(Self::Any);
        }

        let mut gte = None;
        let mut lte = None;
        let mut exact = None;

        for part in s.split(',').map(str::trim) {
            if let Some(rest) = part.strip_prefix(">=") {
                gte = Some(non_empty(rest.trim(), s)?);
            } else if let Some(rest) = part.strip_prefix("<=") {
                lte = Some(non_empty(rest.trim(), s)?);
            } else if let Some(rest) = part.strip_prefix('=') {
                exact = Some(non_empty(rest.trim(), s)?);
            } else if part.starts_with(['<', '>', '!']) {
                return Err(Error::invalid_metadata(format!(
                    "unsupported version operator in '{s}'"
                )));
            } else {
                exact = Some(non_empty(part, s)?);
            }
        }

        match exact {
            Some(_) if gte.is_some() || lte.is_some() => Err(Error::invalid_metadata(format!(
                "exact version cannot be combined with a range in '{s}'"
            ))),
            Some(version) => Ok(Self::Exact(version)),
            None => Ok(Self::range(gte.as_deref(), lte.as_deref())),
        }
    }

    /// Check if a concrete version satisfies this constraint
    pub fn matches(&self, version: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(v) => version == v,
            Self::Range { gte, lte } => {
                gte.as_deref().is_none_or(|low| version >= low)
                    && lte.as_deref().is_none_or(|high| version <= high)
            }
        }
    }

    /// Intersect two constraints on the same name
    ///
    /// Returns `None` when no version can satisfy both.
    pub fn merge(&self, other: &VersionConstraint) -> Option<VersionConstraint> {
        match (self, other) {
            (Self::Any, c) | (c, Self::Any) => Some(c.clone()),
            (Self::Exact(v), c) | (c, Self::Exact(v)) => {
                c.matches(v).then(|| Self::Exact(v.clone()))
            }
            (
                Self::Range { gte: g1, lte: l1 },
                Self::Range { gte: g2, lte: l2 },
            ) => {
                let gte = g1.as_deref().max(g2.as_deref());
                let lte = match (l1.as_deref(), l2.as_deref()) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                if let (Some(low), Some(high)) = (gte, lte)
                    && low > high
                {
                    return None;
                }
                Some(Self::range(gte, lte))
            }
        }
    }

    /// Check if two constraints can be satisfied simultaneously
    pub fn is_compatible_with(&self, other: &VersionConstraint) -> bool {
        self.merge(other).is_some()
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Intersect any number of constraints
pub fn merge_constraints<'a, I>(constraints: I) -> Option<VersionConstraint>
where
    I: IntoIterator<Item = &'a VersionConstraint>,
{
    constraints
        .into_iter()
        .try_fold(VersionConstraint::Any, |acc, c| acc.merge(c))
}

fn non_empty(version: &str, original: &str) -> Result<String> {
    if version.is_empty() {
        return Err(Error::invalid_metadata(format!(
            "empty version in constraint '{original}'"
        )));
    }
    Ok(version.to_string())
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Exact(v) => write!(f, "= {v}"),
            Self::Range { gte, lte } => match (gte, lte) {
                (Some(low), Some(high)) => write!(f, ">= {low}, <= {high}"),
                (Some(low), None) => write!(f, ">= {low}"),
                (None, Some(high)) => write!(f, "<= {high}"),
                (None, None) => write!(f, "*"),
            },
        }
    }
}

/// Document form of a constraint: `"1.0"` or `{"$gte": "1.0", "$lte": "2.0"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VersionDocument {
    Exact(String),
    Range(RangeDocument),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeDocument {
    #[serde(rename = "$gte", default, skip_serializing_if = "Option::is_none")]
    gte: Option<String>,
    #[serde(rename = "$lte", default, skip_serializing_if = "Option::is_none")]
    lte: Option<String>,
}

impl TryFrom<VersionDocument> for VersionConstraint {
    type Error = String;

    fn try_from(doc: VersionDocument) -> std::result::Result<Self, Self::Error> {
        match doc {
            VersionDocument::Exact(v) if v.is_empty() => Err("empty VERSION".to_string()),
            VersionDocument::Exact(v) => Ok(Self::Exact(v)),
            VersionDocument::Range(r) => Ok(Self::range(r.gte.as_deref(), r.lte.as_deref())),
        }
    }
}

impl From<VersionConstraint> for VersionDocument {
    fn from(constraint: VersionConstraint) -> Self {
        match constraint {
            VersionConstraint::Exact(v) => Self::Exact(v),
            VersionConstraint::Any => Self::Range(RangeDocument {
                gte: None,
                lte: None,
            }),
            VersionConstraint::Range { gte, lte } => Self::Range(RangeDocument { gte, lte }),
        }
    }
}
