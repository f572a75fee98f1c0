// src/metadata.rs

//! Package metadata documents and stored candidates
//!
//! A metadata document carries NAME, VERSION, an optional DEPENDENCIES list
//! and any number of extra attributes. The resolver only reads the first
//! three; everything else is passed through untouched.

use crate::error::{Error, Result};
use crate::requirement::Requirement;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata document describing one stored package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "VERSION")]
    pub version: String,
    #[serde(rename = "DEPENDENCIES", default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Requirement>,
    /// Extra attributes, kept verbatim
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_dependency(mut self, requirement: Requirement) -> Self {
        self.dependencies.push(requirement);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Parse and validate a metadata document
    pub fn from_document(doc: &Value) -> Result<Self> {
        let metadata: Self = serde_json::from_value(doc.clone())
            .map_err(|e| Error::invalid_metadata(format!("bad package metadata {doc}: {e}")))?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_metadata("NAME is empty"));
        }
        if self.version.trim().is_empty() {
            return Err(Error::invalid_metadata(format!("VERSION of {} is empty", self.name)));
        }
        for dep in &self.dependencies {
            dep.validate()?;
        }
        Ok(())
    }

    /// Canonical JSON used for the uniqueness check
    ///
    /// Object keys come out sorted, so two documents with the same content
    /// always produce the same string regardless of the order they were built in.
    pub fn canonical_json(&self) -> Result<String> {
        let value = sort_keys(serde_json::to_value(self)?);
        Ok(serde_json::to_string(&value)?)
    }

    /// Graph key of this package: `name:version`
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// A concrete stored package version returned by a repository lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Repository row id
    pub id: i64,
    pub metadata: PackageMetadata,
    /// Content address of the payload
    pub digest: String,
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn dependencies(&self) -> &[Requirement] {
        &self.metadata.dependencies
    }

    pub fn key(&self) -> String {
        self.metadata.key()
    }
}
