// src/repository/sqlite.rs

//! SQLite-backed package repository

use super::{PackageRepository, StoredPackage};
use crate::db;
use crate::db::models::{DependencyEntry, PackageEntry};
use crate::error::{Error, Result};
use crate::filesystem::CasStore;
use crate::hash::HashAlgorithm;
use crate::metadata::{Candidate, PackageMetadata};
use crate::resolver::ResolutionGraph;
use crate::version::VersionConstraint;
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Repository keeping metadata rows in SQLite and payloads in a [`CasStore`]
///
/// The connection sits behind a mutex so one repository can serve several
/// threads. A charge holds it from the duplicate check until its row is
/// committed, so only the winner of two racing identical charges writes a
/// payload object.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    cas: CasStore,
}

impl SqliteRepository {
    /// Wrap an already migrated connection
    pub fn new(conn: Connection, cas: CasStore) -> Self {
        Self {
            conn: Mutex::new(conn),
            cas,
        }
    }

    /// Open the database at `db_path` and the object store at `objects_dir`
    pub fn open(
        db_path: impl AsRef<Path>,
        objects_dir: impl AsRef<Path>,
        algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let conn = db::open(db_path)?;
        let cas = CasStore::with_algorithm(objects_dir, algorithm)?;
        Ok(Self::new(conn, cas))
    }

    /// In-memory metadata with payloads under `objects_dir`
    pub fn in_memory(objects_dir: impl AsRef<Path>) -> Result<Self> {
        let conn = db::open_in_memory()?;
        let cas = CasStore::new(objects_dir)?;
        Ok(Self::new(conn, cas))
    }

    pub fn cas(&self) -> &CasStore {
        &self.cas
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-query cannot leave SQLite itself inconsistent
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn to_stored(entry: &PackageEntry) -> StoredPackage {
        StoredPackage {
            id: entry.id.unwrap_or_default(),
            name: entry.name.clone(),
            version: entry.version.clone(),
            digest: entry.digest.clone(),
            size: u64::try_from(entry.size).unwrap_or_default(),
        }
    }
}

impl PackageRepository for SqliteRepository {
    fn find_candidates(&self, name: &str, constraint: &VersionConstraint) -> Result<Vec<Candidate>> {
        let entries = PackageEntry::find_by_name(&self.conn(), name)?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for entry in entries {
            if !seen.insert(entry.version.clone()) || !constraint.matches(&entry.version) {
                continue;
            }
            candidates.push(Candidate {
                id: entry.id.unwrap_or_default(),
                metadata: entry.parse_metadata()?,
                digest: entry.digest,
            });
        }

        debug!(
            "{} candidate(s) for {} {}",
            candidates.len(),
            name,
            constraint
        );
        Ok(candidates)
    }

    fn name_exists(&self, name: &str) -> Result<bool> {
        PackageEntry::name_exists(&self.conn(), name)
    }

    fn insert(&self, metadata: &PackageMetadata, payload: &[u8]) -> Result<StoredPackage> {
        metadata.validate()?;
        let canonical = metadata.canonical_json()?;

        // Held across the object write, so a rejected charge stores nothing
        let mut conn = self.conn();
        if PackageEntry::metadata_exists(&conn, &canonical)? {
            return Err(Error::YetInBag {
                name: metadata.name.clone(),
                version: metadata.version.clone(),
            });
        }

        let fresh = !self.cas.exists(&self.cas.compute_hash(payload));
        let digest = self.cas.store(payload)?;

        let mut entry = PackageEntry::new(
            &metadata.name,
            &metadata.version,
            canonical,
            digest,
            i64::try_from(payload.len()).unwrap_or(i64::MAX),
        );

        let inserted = db::transaction(&mut conn, |tx| {
            let package_id = entry.insert(tx)?;
            for dep in &metadata.dependencies {
                DependencyEntry::new(package_id, &dep.name).insert(tx)?;
            }
            Ok(())
        });

        if let Err(e) = inserted {
            if fresh && !PackageEntry::digest_referenced(&conn, &entry.digest)? {
                self.cas.remove(&entry.digest)?;
            }
            return Err(e);
        }

        info!("Stored {} ({} bytes)", metadata.key(), payload.len());
        Ok(Self::to_stored(&entry))
    }

    fn get_payload(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        let entry = PackageEntry::find_by_name_version(&self.conn(), name, version)?;
        match entry {
            Some(entry) => self.cas.retrieve(&entry.digest),
            None => Err(Error::NotInBag {
                name: format!("{name}:{version}"),
                graph: Box::new(ResolutionGraph::new()),
            }),
        }
    }

    fn list_all(&self) -> Result<Vec<StoredPackage>> {
        let entries = PackageEntry::list_all(&self.conn())?;
        Ok(entries.iter().map(Self::to_stored).collect())
    }

    fn find_dependents(&self, name: &str) -> Result<Vec<String>> {
        DependencyEntry::dependent_names(&self.conn(), name)
    }
}
