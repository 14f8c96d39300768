//! Content digests of bundle directories.
//!
//! A bundle is identified by the SHA256 of its relative paths and file
//! contents, so two installs of the same build compare equal regardless of
//! mtimes or where they live.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Compute the tree digest of `root`.
///
/// Entries are visited in sorted order. Symlinks are hashed by target,
/// not followed.
pub fn tree_digest(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            hasher.update(b"d\0");
            hasher.update(relative.as_bytes());
            hasher.update(b"\0");
        } else if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            hasher.update(b"l\0");
            hasher.update(relative.as_bytes());
            hasher.update(b"\0");
            hasher.update(target.to_string_lossy().as_bytes());
            hasher.update(b"\0");
        } else {
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            hasher.update(b"f\0");
            hasher.update(relative.as_bytes());
            hasher.update(b"\0");
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(&content);
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest of `root` if it exists and is readable.
/// Logs a warning if it exists but can't be read.
pub fn try_tree_digest(root: &Path) -> Option<String> {
    if !root.exists() {
        return None;
    }
    match tree_digest(root) {
        Ok(digest) => Some(digest),
        Err(e) => {
            eprintln!("  [WARN] Cannot digest {}: {:#}", root.display(), e);
            None
        }
    }
}
