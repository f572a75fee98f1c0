// src/repository/mod.rs

//! Package repository contract
//!
//! The resolver and the bag only talk to storage through
//! [`PackageRepository`]. The shipped implementation is
//! [`SqliteRepository`], which keeps metadata in SQLite and payloads in a
//! content-addressed object store.

mod sqlite;

pub use sqlite::SqliteRepository;

use crate::error::Result;
use crate::metadata::{Candidate, PackageMetadata};
use crate::version::VersionConstraint;

/// Handle to a stored package, returned by `insert` and `list_all`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPackage {
    pub id: i64,
    pub name: String,
    pub version: String,
    /// Content address of the payload
    pub digest: String,
    /// Payload size in bytes
    pub size: u64,
}

impl StoredPackage {
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

/// Storage backend for metadata documents and payloads
///
/// Implementations must be safe to share between threads; concurrent
/// `insert` calls with identical metadata must leave exactly one stored
/// document, with every other caller receiving `YetInBag`.
pub trait PackageRepository: Send + Sync {
    /// Stored versions of `name` satisfying `constraint`, one per version, in
    /// the order they were charged
    fn find_candidates(&self, name: &str, constraint: &VersionConstraint) -> Result<Vec<Candidate>>;

    /// Whether any version of `name` is stored
    fn name_exists(&self, name: &str) -> Result<bool>;

    /// Atomically store a metadata document with its payload
    fn insert(&self, metadata: &PackageMetadata, payload: &[u8]) -> Result<StoredPackage>;

    /// Payload of an exact stored version
    fn get_payload(&self, name: &str, version: &str) -> Result<Vec<u8>>;

    /// Every stored package, in charge order
    fn list_all(&self) -> Result<Vec<StoredPackage>>;

    /// Names of stored packages declaring a dependency on `name`
    fn find_dependents(&self, name: &str) -> Result<Vec<String>>;
}
