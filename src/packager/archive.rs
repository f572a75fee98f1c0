// src/packager/archive.rs

//! Gzip-compressed tar payloads

use super::{BoxInstruction, Packager, UnboxInstruction};
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use glob::Pattern;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, EntryType, Header};
use tracing::debug;
use walkdir::WalkDir;

/// Packager writing payloads as `.tar.gz` streams
///
/// Entries are written in sorted order with a fixed mtime, so boxing the
/// same tree twice yields the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarPackager;

/// Modification time stamped on every entry
const ENTRY_MTIME: u64 = 0;

impl TarPackager {
    pub fn new() -> Self {
        Self
    }
}

impl Packager for TarPackager {
    fn box_files(&self, instructions: &[BoxInstruction]) -> Result<Vec<u8>> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut archive = Builder::new(encoder);
        let mut written: HashSet<PathBuf> = HashSet::new();

        for instruction in instructions {
            let root = if instruction.from.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                instruction.from.clone()
            };
            let prefix = relative_path(&instruction.to)?;
            let pattern = Pattern::new(&instruction.filter)?;

            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                if !pattern.matches_path(rel) {
                    continue;
                }

                let archive_path = prefix.join(rel);
                if !written.insert(archive_path.clone()) {
                    debug!("Skipping duplicate payload entry {}", archive_path.display());
                    continue;
                }

                let content = fs::read(entry.path())?;
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Regular);
                header.set_mode(file_mode(&entry.metadata()?));
                header.set_size(content.len() as u64);
                header.set_mtime(ENTRY_MTIME);
                header.set_cksum();
                archive.append_data(&mut header, &archive_path, content.as_slice())?;
            }
        }

        debug!("Boxed {} file(s)", written.len());
        let encoder = archive.into_inner()?;
        Ok(encoder.finish()?)
    }

    fn unbox(&self, payload: &[u8], instructions: &[UnboxInstruction]) -> Result<Vec<PathBuf>> {
        let files = read_entries(payload)?;
        let mut created = Vec::new();

        for instruction in instructions {
            let from = relative_path(&instruction.from)?;
            let pattern = Pattern::new(&instruction.filter)?;

            for file in &files {
                let Ok(rel) = file.path.strip_prefix(&from) else {
                    continue;
                };
                if rel.as_os_str().is_empty() || !pattern.matches_path(rel) {
                    continue;
                }

                let dest = instruction.to.join(rel);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&dest, &file.content)?;
                set_mode(&dest, file.mode)?;
                created.push(dest);
            }
        }

        debug!("Unboxed {} file(s)", created.len());
        Ok(created)
    }
}

struct PayloadFile {
    path: PathBuf,
    mode: u32,
    content: Vec<u8>,
}

fn read_entries(payload: &[u8]) -> Result<Vec<PayloadFile>> {
    let mut archive = Archive::new(GzDecoder::new(payload));
    let mut files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = relative_path(&entry.path()?)?;
        let mode = entry.header().mode()?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        files.push(PayloadFile {
            path,
            mode,
            content,
        });
    }

    Ok(files)
}

/// Normalize a payload-relative path, rejecting anything that leaves the root
fn relative_path(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathTraversal(path.display().to_string()));
            }
        }
    }
    Ok(normalized)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Never drop the owner's read/write bit on unpacked files
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::create_dir_all(dir.path().join("doc")).unwrap();
        fs::write(dir.path().join("bin/run.sh"), b"#!/bin/sh\n").unwrap();
        fs::write(dir.path().join("bin/tool"), b"\x7fELF").unwrap();
        fs::write(dir.path().join("doc/README"), b"readme").unwrap();
        dir
    }

    #[test]
    fn test_box_then_unbox_everything() {
        let src = tree();
        let out = TempDir::new().unwrap();
        let packager = TarPackager::new();

        let payload = packager
            .box_files(&[BoxInstruction::new(src.path(), "pkg", "*")])
            .unwrap();
        let created = packager
            .unbox(&payload, &[UnboxInstruction::new("pkg", out.path(), "*")])
            .unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(fs::read(out.path().join("bin/run.sh")).unwrap(), b"#!/bin/sh\n");
        assert_eq!(fs::read(out.path().join("doc/README")).unwrap(), b"readme");
    }

    #[test]
    fn test_filters_apply_on_both_sides() {
        let src = tree();
        let out = TempDir::new().unwrap();
        let packager = TarPackager::new();

        let payload = packager
            .box_files(&[BoxInstruction::new(src.path().join("bin"), "", "*.sh")])
            .unwrap();
        let created = packager
            .unbox(&payload, &[UnboxInstruction::new("", out.path(), "*")])
            .unwrap();
        assert_eq!(created, vec![out.path().join("run.sh")]);

        let none = packager
            .unbox(&payload, &[UnboxInstruction::new("", out.path(), "*.txt")])
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_boxing_is_deterministic() {
        let src = tree();
        let packager = TarPackager::new();
        let instructions = [BoxInstruction::new(src.path(), "", "*")];
        assert_eq!(
            packager.box_files(&instructions).unwrap(),
            packager.box_files(&instructions).unwrap()
        );
    }

    #[test]
    fn test_traversal_is_rejected() {
        let packager = TarPackager::new();
        let err = packager
            .box_files(&[BoxInstruction::new(".", "../escape", "*")])
            .unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));

        let payload = packager.box_files(&[]).unwrap();
        let err = packager
            .unbox(&payload, &[UnboxInstruction::new("/etc", "out", "*")])
            .unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
    }

    #[test]
    fn test_bad_filter() {
        let packager = TarPackager::new();
        let err = packager
            .box_files(&[BoxInstruction::new(".", "", "[")])
            .unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }
}
