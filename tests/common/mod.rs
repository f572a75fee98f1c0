// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use bagman::{Bag, BagConfig, BoxInstruction, PackageMetadata, Requirement, SilentObserver};
use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route tracing output to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A bag living in a temporary directory.
///
/// Keep the struct alive for as long as the bag is used; dropping it
/// removes the database, the object store and any staged files.
pub struct TestBag {
    pub dir: TempDir,
    pub bag: Bag,
}

impl TestBag {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let bag = Bag::open(&BagConfig::in_dir(dir.path().join("store"))).unwrap();
        Self { dir, bag }
    }

    /// Stage a source tree holding one file named after the package and
    /// charge it under `metadata`.
    pub fn charge(&self, metadata: PackageMetadata) {
        let src = self.stage(&metadata.name, &metadata.version);
        self.bag
            .charge(
                &[BoxInstruction::new(&src, "", "*")],
                &metadata,
                &SilentObserver,
            )
            .unwrap();
    }

    /// Write `<name>-<version>.txt` into a fresh source directory.
    pub fn stage(&self, name: &str, version: &str) -> PathBuf {
        let src = self.dir.path().join("src").join(format!("{name}-{version}"));
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join(format!("{name}-{version}.txt")), format!("{name} {version}\n")).unwrap();
        src
    }

    /// Destination directory for unboxed files.
    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }
}

/// Shorthand for a package without dependencies.
pub fn pkg(name: &str, version: &str) -> PackageMetadata {
    PackageMetadata::new(name, version)
}

/// Store the chain `B:1 -> C:1 -> D[1..2]` with `D:1` and `D:2` available.
pub fn chain_bag() -> TestBag {
    let test = TestBag::new();
    test.charge(pkg("D", "1"));
    test.charge(pkg("C", "1").with_dependency(Requirement::new(
        "D",
        bagman::VersionConstraint::range(Some("1"), Some("2")),
    )));
    test.charge(pkg("D", "2"));
    test.charge(pkg("B", "1").with_dependency(Requirement::exact("C", "1")));
    test
}
