// src/config.rs
//! Configuration file parsing for a bag
//!
//! A bag is configured by a small TOML file:
//!
//! ```toml
//! db_path = "/var/lib/bagman/bag.db"
//! objects_dir = "/var/lib/bagman/objects"   # optional
//! hash_algorithm = "sha256"                 # or "xxh128"
//! selection = "first"                       # or "highest"
//! ```

use crate::db::paths;
use crate::hash::HashAlgorithm;
use crate::resolver::SelectionPolicy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// TOML configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BagConfig {
    /// SQLite database holding package metadata
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Payload object store; defaults to `objects/` next to the database
    #[serde(default)]
    pub objects_dir: Option<PathBuf>,

    /// Content address algorithm for payloads
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Tie-break between equally valid alternative versions
    #[serde(default)]
    pub selection: SelectionPolicy,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            objects_dir: None,
            hash_algorithm: HashAlgorithm::default(),
            selection: SelectionPolicy::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DB_PATH)
}

impl BagConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BagConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at `dir`: `dir/bag.db` plus `dir/objects`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            db_path: dir.as_ref().join("bag.db"),
            ..Self::default()
        }
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Effective object store directory
    pub fn objects_dir(&self) -> PathBuf {
        self.objects_dir
            .clone()
            .unwrap_or_else(|| paths::objects_dir(&self.db_path))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.db_path.file_name().is_none() {
            anyhow::bail!("db_path must name a file, got {:?}", self.db_path);
        }

        if self.objects_dir() == self.db_path {
            anyhow::bail!("objects_dir must differ from db_path");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: BagConfig = toml::from_str("").unwrap();
        assert_eq!(config, BagConfig::default());
        assert_eq!(config.objects_dir(), PathBuf::from("/var/lib/bagman/objects"));
        config.validate().unwrap();
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bag.toml");
        std::fs::write(
            &path,
            r#"
db_path = "/srv/bag/meta.db"
objects_dir = "/srv/blobs"
hash_algorithm = "xxh128"
selection = "highest"
"#,
        )
        .unwrap();

        let config = BagConfig::load(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/srv/bag/meta.db"));
        assert_eq!(config.objects_dir(), PathBuf::from("/srv/blobs"));
        assert_eq!(config.hash_algorithm, HashAlgorithm::Xxh128);
        assert_eq!(config.selection, SelectionPolicy::HighestVersion);
    }

    #[test]
    fn test_rejects_bad_files() {
        let dir = TempDir::new().unwrap();

        let unknown = dir.path().join("unknown.toml");
        std::fs::write(&unknown, "colour = \"blue\"\n").unwrap();
        assert!(BagConfig::load(&unknown).is_err());

        let clash = dir.path().join("clash.toml");
        std::fs::write(&clash, "db_path = \"/x/bag.db\"\nobjects_dir = \"/x/bag.db\"\n").unwrap();
        let err = BagConfig::load(&clash).unwrap_err();
        assert!(err.to_string().contains("objects_dir"));

        assert!(BagConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_in_dir() {
        let config = BagConfig::in_dir("/tmp/bag");
        assert_eq!(config.db_path, PathBuf::from("/tmp/bag/bag.db"));
        assert_eq!(config.objects_dir(), PathBuf::from("/tmp/bag/objects"));
    }
}
