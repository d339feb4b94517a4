//! Replace-existing file move.
//! - Rename is attempted first; an existing destination file is replaced (last writer wins).
//! - On Windows, removes an existing destination first (rename doesn't overwrite there).
//! - Cross-filesystem moves fall back to copy into a hidden sibling, rename, then remove the source.
//! - On Unix, best-effort fsync of the destination directory after rename.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::helpers::io_error_with_help;
use super::util::{fsync_dir, is_cross_device, partial_sibling};

pub fn move_replacing(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if dst.is_file() {
            if let Err(e) = fs::remove_file(dst) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(io_error_with_help("remove existing destination", dst)(e));
                }
            }
        }
    }

    match fs::rename(src, dst) {
        Ok(()) => {}
        Err(e) if is_cross_device(&e) => {
            debug!(src = %src.display(), dst = %dst.display(), "cross-device move; copying");
            copy_then_remove(src, dst)?;
        }
        Err(e) => return Err(io_error_with_help("move file", dst)(e)),
    }

    if let Some(parent) = dst.parent() {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = fsync_dir(parent);
    }

    Ok(())
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    let tmp = partial_sibling(dst);
    if let Err(e) = fs::copy(src, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("copy to temporary file", &tmp)(e));
    }
    if let Err(e) = fs::rename(&tmp, dst) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("rename temporary file", dst)(e));
    }
    fs::remove_file(src).with_context(|| format!("remove original file {}", src.display()))
}
