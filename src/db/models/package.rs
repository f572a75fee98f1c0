// src/db/models/package.rs

//! PackageEntry model - one charged metadata document

use crate::error::{Error, Result};
use crate::metadata::PackageMetadata;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

const COLUMNS: &str = "id, name, version, metadata, digest, size, charged_at";

/// A stored package row
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub id: Option<i64>,
    pub name: String,
    pub version: String,
    /// Canonical JSON of the full metadata document
    pub metadata: String,
    /// Content address of the payload in the object store
    pub digest: String,
    pub size: i64,
    pub charged_at: Option<String>,
}

impl PackageEntry {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        metadata: impl Into<String>,
        digest: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            version: version.into(),
            metadata: metadata.into(),
            digest: digest.into(),
            size,
            charged_at: None,
        }
    }

    /// Insert this package
    ///
    /// A row with the same canonical metadata already present yields
    /// [`Error::YetInBag`].
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let inserted = conn.execute(
            "INSERT INTO packages (name, version, metadata, digest, size)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &self.name,
                &self.version,
                &self.metadata,
                &self.digest,
                &self.size,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return Err(Error::YetInBag {
                    name: self.name.clone(),
                    version: self.version.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Whether a row with exactly this canonical metadata is stored
    pub fn metadata_exists(conn: &Connection, metadata: &str) -> Result<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM packages WHERE metadata = ?1)",
            [metadata],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Whether any row points at the payload object `digest`
    pub fn digest_referenced(conn: &Connection, digest: &str) -> Result<bool> {
        let referenced = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM packages WHERE digest = ?1)",
            [digest],
            |row| row.get(0),
        )?;
        Ok(referenced)
    }

    /// All versions of `name`, in the order they were charged
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages WHERE name = ?1 ORDER BY id"
        ))?;

        let packages = stmt
            .query_map([name], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(packages)
    }

    /// First charged row for an exact name and version
    pub fn find_by_name_version(conn: &Connection, name: &str, version: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages WHERE name = ?1 AND version = ?2 ORDER BY id LIMIT 1"
        ))?;
        let package = stmt
            .query_row(params![name, version], Self::from_row)
            .optional()?;
        Ok(package)
    }

    /// Whether any version of `name` is stored
    pub fn name_exists(conn: &Connection, name: &str) -> Result<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM packages WHERE name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List every package in charge order
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages ORDER BY id"))?;

        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(packages)
    }

    /// Decode the stored metadata document
    pub fn parse_metadata(&self) -> Result<PackageMetadata> {
        let value: serde_json::Value = serde_json::from_str(&self.metadata)?;
        PackageMetadata::from_document(&value)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            version: row.get(2)?,
            metadata: row.get(3)?,
            digest: row.get(4)?,
            size: row.get(5)?,
            charged_at: row.get(6)?,
        })
    }
}
