// src/db/models/dependency.rs

//! DependencyEntry model - linking packages to the names they require

use crate::error::Result;
use rusqlite::{Connection, params};

/// Dependency entry linking a package to a name it requires
///
/// Constraints live in the package's metadata document; this table only
/// indexes names for reverse lookups.
#[derive(Debug, Clone)]
pub struct DependencyEntry {
    pub id: Option<i64>,
    pub package_id: i64,
    pub depends_on_name: String,
}

impl DependencyEntry {
    pub fn new(package_id: i64, depends_on_name: impl Into<String>) -> Self {
        Self {
            id: None,
            package_id,
            depends_on_name: depends_on_name.into(),
        }
    }

    /// Insert this dependency into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO dependencies (package_id, depends_on_name) VALUES (?1, ?2)",
            params![&self.package_id, &self.depends_on_name],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Names of stored packages that declare a dependency on `package_name`
    pub fn dependent_names(conn: &Connection, package_name: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT p.name FROM dependencies d
             JOIN packages p ON p.id = d.package_id
             WHERE d.depends_on_name = ?1
             ORDER BY p.name",
        )?;

        let names = stmt
            .query_map([package_name], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(names)
    }
}
