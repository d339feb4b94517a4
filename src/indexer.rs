//! Gallery folder index.
//!
//! Lists every directory below a gallery root (recursively, root excluded)
//! as absolute paths, one per line. Used to keep an up-to-date list of the
//! folders path codes can point at.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::SortboxError;

/// All subdirectories of `root`, depth-first, siblings sorted by name.
/// Unreadable subtrees are skipped with a warning.
pub fn collect_subdirectories(root: &Path) -> Result<Vec<PathBuf>, SortboxError> {
    if !root.is_dir() {
        return Err(SortboxError::InvalidDirectory(root.to_path_buf()));
    }
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut dirs = Vec::new();
    for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
        match entry {
            Ok(e) if e.file_type().is_dir() => dirs.push(e.into_path()),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable entry while indexing"),
        }
    }
    debug!(root = %root.display(), count = dirs.len(), "Indexed gallery folders");
    Ok(dirs)
}

/// Write `dirs` one per line to `out`, replacing any previous index.
pub fn write_index(dirs: &[PathBuf], out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create index directory '{}'", parent.display()))?;
    }
    let mut file =
        fs::File::create(out).with_context(|| format!("create index file '{}'", out.display()))?;
    for dir in dirs {
        writeln!(file, "{}", dir.display())
            .with_context(|| format!("write index file '{}'", out.display()))?;
    }
    Ok(())
}
