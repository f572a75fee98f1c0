// src/lib.rs

//! Bagman: a content-addressed package store with transitive delivery
//!
//! Packages are charged into the bag as a payload plus a metadata document
//! (NAME, VERSION, optional DEPENDENCIES, arbitrary extra attributes), and
//! delivered back together with everything they transitively depend on.
//!
//! # Architecture
//!
//! - Metadata in SQLite, payloads in a content-addressed object store
//! - Breadth-first resolution with alternative selection and conflict reports
//! - Every resolution failure carries a diagnostic graph renderable as DOT
//! - Observation through an explicit [`Observer`] argument, logging through tracing

mod bag;
pub mod config;
pub mod db;
mod error;
pub mod filesystem;
pub mod hash;
pub mod metadata;
pub mod observer;
pub mod packager;
pub mod repository;
pub mod requirement;
pub mod resolver;
pub mod version;

pub use bag::{Bag, DEPENDENCIES_KEY, Delivery, UNBOX_KEY};
pub use config::BagConfig;
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use metadata::{Candidate, PackageMetadata};
pub use observer::{BagEvent, CallbackObserver, LogObserver, Observer, SilentObserver};
pub use packager::{BoxInstruction, Packager, TarPackager, UnboxInstruction};
pub use repository::{PackageRepository, SqliteRepository, StoredPackage};
pub use requirement::Requirement;
pub use resolver::{
    Conflict, ResolutionGraph, ResolutionPlan, Resolver, SelectionPolicy, discover, to_dot,
};
pub use version::VersionConstraint;
