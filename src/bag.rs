// src/bag.rs

//! The bag: a package store with transitive delivery
//!
//! `charge` boxes files into a payload and stores it under its metadata.
//! `deliver` resolves a request against everything stored and unboxes
//! every resolved package, dependencies included.

use crate::config::BagConfig;
use crate::error::{Error, Result};
use crate::metadata::{Candidate, PackageMetadata};
use crate::observer::{BagEvent, Observer};
use crate::packager::{BoxInstruction, Packager, TarPackager, UnboxInstruction};
use crate::repository::{PackageRepository, SqliteRepository, StoredPackage};
use crate::requirement::Requirement;
use crate::resolver::{ResolutionGraph, ResolutionPlan, Resolver, SelectionPolicy};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Key of the dependency list in a delivery document
pub const DEPENDENCIES_KEY: &str = "DEPENDENCIES";
/// Key of the unbox instruction list in a delivery document
pub const UNBOX_KEY: &str = "UNBOX";

/// Outcome of a successful delivery
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Every file written, across all resolved packages, in resolution order
    pub files: Vec<PathBuf>,
    /// The packages that were unboxed
    pub resolved: Vec<Candidate>,
    pub graph: ResolutionGraph,
}

/// Package store composed of a repository, a packager and a selection policy
pub struct Bag<R = SqliteRepository, P = TarPackager> {
    repo: R,
    packager: P,
    policy: SelectionPolicy,
}

impl Bag {
    /// Open the SQLite/CAS backed bag described by `config`
    pub fn open(config: &BagConfig) -> Result<Self> {
        let repo = SqliteRepository::open(
            &config.db_path,
            config.objects_dir(),
            config.hash_algorithm,
        )?;
        info!("Opened bag at {}", config.db_path.display());
        Ok(Self::new(repo, TarPackager::new()).with_policy(config.selection))
    }
}

impl<R: PackageRepository, P: Packager> Bag<R, P> {
    pub fn new(repo: R, packager: P) -> Self {
        Self {
            repo,
            packager,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn resolver(&self) -> Resolver<'_, R> {
        Resolver::new(&self.repo).with_policy(self.policy)
    }

    /// Box files and store them under `metadata`
    ///
    /// Fails with [`Error::YetInBag`] when identical metadata is already
    /// stored, whatever the payload.
    pub fn charge(
        &self,
        instructions: &[BoxInstruction],
        metadata: &PackageMetadata,
        observer: &dyn Observer,
    ) -> Result<StoredPackage> {
        metadata.validate()?;
        let payload = self.packager.box_files(instructions)?;
        let stored = self.repo.insert(metadata, &payload)?;

        observer.notify(&BagEvent::Charged {
            name: stored.name.clone(),
            version: stored.version.clone(),
            digest: stored.digest.clone(),
        });
        Ok(stored)
    }

    /// [`Bag::charge`] taking the metadata as a JSON document
    pub fn charge_json(
        &self,
        instructions: &[BoxInstruction],
        metadata: &Value,
        observer: &dyn Observer,
    ) -> Result<StoredPackage> {
        let metadata = PackageMetadata::from_document(metadata)?;
        self.charge(instructions, &metadata, observer)
    }

    /// Resolve `requests` without unboxing anything
    pub fn discover(&self, requests: &[Requirement], observer: &dyn Observer) -> Result<ResolutionPlan> {
        self.resolver().discover(requests, observer)
    }

    /// Resolve `requests` and unbox every resolved package
    ///
    /// Files accumulate across packages. A failure while unboxing leaves the
    /// files of earlier packages in place.
    pub fn deliver(
        &self,
        requests: &[Requirement],
        instructions: &[UnboxInstruction],
        observer: &dyn Observer,
    ) -> Result<Delivery> {
        let plan = self.discover(requests, observer)?;
        let mut files = Vec::new();

        for candidate in &plan.resolved {
            let payload = self.repo.get_payload(candidate.name(), candidate.version())?;
            let created = self.packager.unbox(&payload, instructions)?;
            debug!("{} unboxed {} file(s)", candidate.key(), created.len());

            observer.notify(&BagEvent::Unboxed {
                name: candidate.name().to_string(),
                version: candidate.version().to_string(),
                files: created.len(),
            });
            files.extend(created);
        }

        observer.notify(&BagEvent::Finished {
            operation: "deliver",
            count: files.len(),
        });

        Ok(Delivery {
            files,
            resolved: plan.resolved,
            graph: plan.graph,
        })
    }

    /// [`Bag::deliver`] driven by a single document
    ///
    /// When the document has a DEPENDENCIES list, those are the requests and
    /// its own NAME/VERSION only describe the consumer. Otherwise the
    /// document itself is the request. UNBOX holds the unbox instructions.
    pub fn deliver_json(&self, document: &Value, observer: &dyn Observer) -> Result<Delivery> {
        let (requests, instructions) = decompose_delivery(document)?;
        self.deliver(&requests, &instructions, observer)
    }

    /// Direct dependencies of the version `request` selects
    pub fn requirements_for(&self, request: &Requirement) -> Result<Vec<Requirement>> {
        self.resolver().requirements_for(request)
    }

    /// Every stored package, in charge order
    pub fn packages(&self) -> Result<Vec<StoredPackage>> {
        self.repo.list_all()
    }

    /// Names of stored packages that depend on `name`
    pub fn dependents_of(&self, name: &str) -> Result<Vec<String>> {
        self.repo.find_dependents(name)
    }
}

/// Split a delivery document into requests and unbox instructions
fn decompose_delivery(document: &Value) -> Result<(Vec<Requirement>, Vec<UnboxInstruction>)> {
    let Some(object) = document.as_object() else {
        return Err(Error::invalid_metadata(format!(
            "delivery document must be an object, got {document}"
        )));
    };

    let requests = match object.get(DEPENDENCIES_KEY) {
        Some(Value::Array(deps)) => deps
            .iter()
            .map(Requirement::from_document)
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(Error::invalid_metadata(format!(
                "{DEPENDENCIES_KEY} must be a list, got {other}"
            )));
        }
        None => vec![Requirement::from_document(document)?],
    };

    let instructions = match object.get(UNBOX_KEY) {
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| Error::invalid_metadata(format!("bad {UNBOX_KEY} instructions: {e}")))?,
        None => Vec::new(),
    };

    Ok((requests, instructions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionConstraint;
    use serde_json::json;

    #[test]
    fn test_decompose_with_dependencies() {
        let doc = json!({
            "NAME": "app",
            "VERSION": "0.1",
            "DEPENDENCIES": [
                {"NAME": "B", "VERSION": "1"},
                {"NAME": "D", "VERSION": {"$gte": "1"}}
            ],
            "UNBOX": [{"FROM": "", "TO": "/opt/app", "FILTER": "*"}]
        });

        let (requests, instructions) = decompose_delivery(&doc).unwrap();
        assert_eq!(
            requests,
            vec![
                Requirement::exact("B", "1"),
                Requirement::new("D", VersionConstraint::range(Some("1"), None)),
            ]
        );
        assert_eq!(instructions, vec![UnboxInstruction::new("", "/opt/app", "*")]);
    }

    #[test]
    fn test_decompose_plain_request() {
        let (requests, instructions) = decompose_delivery(&json!({"NAME": "B", "VERSION": "1"})).unwrap();
        assert_eq!(requests, vec![Requirement::exact("B", "1")]);
        assert!(instructions.is_empty());
    }

    #[test]
    fn test_decompose_rejects_bad_shapes() {
        assert!(decompose_delivery(&json!(["B"])).is_err());
        assert!(decompose_delivery(&json!({"NAME": "A", "DEPENDENCIES": "B"})).is_err());
        assert!(decompose_delivery(&json!({"NAME": "A", "UNBOX": 3})).is_err());
        assert!(decompose_delivery(&json!({"VERSION": "1"})).is_err());
    }
}
