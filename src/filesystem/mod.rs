// src/filesystem/mod.rs

//! On-disk payload storage

mod cas;

pub use cas::CasStore;
