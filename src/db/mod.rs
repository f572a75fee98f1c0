// src/db/mod.rs

//! SQLite storage for package metadata
//!
//! Connections are opened with foreign keys enforced and WAL journaling
//! for file-backed databases. The schema is migrated on open.

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::Result;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::debug;

/// Open (creating if needed) the database at `db_path` and migrate it
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Opening package database at {}", db_path.display());
    let conn = Connection::open(db_path)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    init(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database, used by tests and throwaway bags
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(conn)
}

/// Apply connection settings and bring the schema up to date
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    schema::migrate(conn)
}

/// Run `f` inside a transaction, committing only if it succeeds
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/bag.db");
        let conn = open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(schema::get_schema_version(&conn).unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();
        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO packages (name, version, metadata, digest, size) VALUES ('A', '1', '{}', 'x', 0)",
                [],
            )?;
            Err(crate::Error::invalid_metadata("abort"))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
