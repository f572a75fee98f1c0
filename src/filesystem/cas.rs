// src/filesystem/cas.rs

//! Content-addressable storage (CAS) for package payloads
//!
//! Payloads are stored by their content hash, so two packages shipping
//! byte-identical payloads share one object on disk.
//!
//! # Hash Algorithm Selection
//!
//! - **SHA-256** (default): Cryptographic hash, safe against tampering
//! - **XXH128**: Fast non-cryptographic hash for pure deduplication

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content-addressable storage manager
#[derive(Debug, Clone)]
pub struct CasStore {
    /// Root directory for object storage (e.g., /var/lib/bagman/objects)
    objects_dir: PathBuf,
    algorithm: HashAlgorithm,
}

impl CasStore {
    /// Create a SHA-256 store rooted at `objects_dir`
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Result<Self> {
        Self::with_algorithm(objects_dir, HashAlgorithm::Sha256)
    }

    /// Create a store with a specific hash algorithm
    pub fn with_algorithm<P: AsRef<Path>>(objects_dir: P, algorithm: HashAlgorithm) -> Result<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();

        if !objects_dir.exists() {
            fs::create_dir_all(&objects_dir)?;
            debug!(
                "Created CAS objects directory: {:?} (algorithm: {})",
                objects_dir, algorithm
            );
        }

        Ok(Self {
            objects_dir,
            algorithm,
        })
    }

    #[inline]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Store content and return its hash
    ///
    /// The content is stored at: objects/{first2}/{rest_of_hash}
    /// Content that is already present is not rewritten.
    pub fn store(&self, content: &[u8]) -> Result<String> {
        let hash = self.compute_hash(content);
        let path = self.hash_to_path(&hash);

        if path.exists() {
            debug!("Content already in CAS: {}", hash);
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a per-writer temp file, then rename into place
        let temp_path = path.with_extension(format!(
            "tmp.{}.{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        debug!("Stored content in CAS: {} ({} bytes)", hash, content.len());
        Ok(hash)
    }

    /// Retrieve content by hash, verifying it on the way out
    pub fn retrieve(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self.hash_to_path(hash);

        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Content not found in CAS: {}", hash),
            )));
        }

        let content = fs::read(&path)?;

        hash::verify_bytes(self.algorithm, &content, hash).map_err(|actual| Error::HashMismatch {
            expected: hash.to_string(),
            actual,
        })?;

        debug!("Retrieved content from CAS: {} ({} bytes)", hash, content.len());
        Ok(content)
    }

    /// Delete an object, returning whether it was present
    pub fn remove(&self, hash: &str) -> Result<bool> {
        match fs::remove_file(self.hash_to_path(hash)) {
            Ok(()) => {
                debug!("Removed content from CAS: {}", hash);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, hash: &str) -> bool {
        self.hash_to_path(hash).exists()
    }

    /// Get the filesystem path for a given hash
    ///
    /// Example: abc123... -> objects/ab/c123...
    pub fn hash_to_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.objects_dir.join(hash);
        }

        let (prefix, suffix) = hash.split_at(2);
        self.objects_dir.join(prefix).join(suffix)
    }

    pub fn compute_hash(&self, content: &[u8]) -> String {
        hash::hash_bytes(self.algorithm, content)
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_retrieve() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::new(temp_dir.path()).unwrap();

        let content = b"payload bytes";
        let hash = cas.store(content).unwrap();
        assert_eq!(hash, hash::sha256(content));
        assert!(cas.exists(&hash));
        assert_eq!(cas.retrieve(&hash).unwrap(), content);
    }

    #[test]
    fn test_store_and_retrieve_xxh128() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::with_algorithm(temp_dir.path(), HashAlgorithm::Xxh128).unwrap();

        let hash = cas.store(b"fast").unwrap();
        assert_eq!(hash.len(), HashAlgorithm::Xxh128.hex_len());
        assert_eq!(cas.retrieve(&hash).unwrap(), b"fast");
    }

    #[test]
    fn test_deduplication() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::new(temp_dir.path()).unwrap();

        let first = cas.store(b"same").unwrap();
        let second = cas.store(b"same").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::new(temp_dir.path()).unwrap();

        let hash = cas.store(b"short lived").unwrap();
        assert!(cas.remove(&hash).unwrap());
        assert!(!cas.exists(&hash));
        assert!(!cas.remove(&hash).unwrap());
    }

    #[test]
    fn test_hash_to_path() {
        let cas = CasStore {
            objects_dir: PathBuf::from("/objects"),
            algorithm: HashAlgorithm::Sha256,
        };
        assert_eq!(cas.hash_to_path("abcdef"), PathBuf::from("/objects/ab/cdef"));
    }

    #[test]
    fn test_retrieve_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::new(temp_dir.path()).unwrap();
        assert!(matches!(cas.retrieve("00ff"), Err(Error::Io(_))));
    }

    #[test]
    fn test_corrupted_object_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cas = CasStore::new(temp_dir.path()).unwrap();

        let hash = cas.store(b"original").unwrap();
        fs::write(cas.hash_to_path(&hash), b"tampered").unwrap();

        let err = cas.retrieve(&hash).unwrap_err();
        assert!(matches!(err, Error::HashMismatch { ref expected, .. } if *expected == hash));
    }
}
