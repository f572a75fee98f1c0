// src/db/paths.rs
//! Centralized path derivation for bag directories

use std::path::{Path, PathBuf};

/// Default location of the package database
pub const DEFAULT_DB_PATH: &str = "/var/lib/bagman/bag.db";

/// Get the directory containing the database
pub fn db_dir(db_path: &Path) -> PathBuf {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => PathBuf::from("/var/lib/bagman"),
    }
}

/// Get the objects (CAS) directory that sits next to the database
pub fn objects_dir(db_path: &Path) -> PathBuf {
    db_dir(db_path).join("objects")
}
