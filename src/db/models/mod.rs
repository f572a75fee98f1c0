// src/db/models/mod.rs

//! Data models for bag database entities
//!
//! Each struct mirrors one table and carries its own insert and lookup
//! queries.

mod dependency;
mod package;

pub use dependency::DependencyEntry;
pub use package::PackageEntry;
