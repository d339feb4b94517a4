//! I/O helper utilities.
//!
//! Enriches io::Error with the operation, the path and a platform-aware hint,
//! usable with `map_err` in anyhow::Result code paths.
//!
//! Usage:
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Format a human-friendly message with op/path plus platform-aware hints.
fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            let hint = match code {
                libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
                libc::EXDEV => Some("cross-filesystem; atomic rename not possible"),
                libc::EBUSY => Some("resource busy; ensure no other process holds the file"),
                libc::ENOENT => Some("path not found; it may have been moved concurrently"),
                libc::EISDIR => Some("a directory with the same name already exists at the destination"),
                libc::ENOTDIR => Some("a file with the same name already exists where a directory is expected"),
                libc::ENOSPC => Some("insufficient space on device"),
                libc::EROFS => Some("read-only filesystem; cannot write here"),
                libc::ENAMETOOLONG => Some("filename or path too long"),
                _ => None,
            };
            if let Some(h) = hint {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
        }
        #[cfg(windows)]
        {
            let hint = match code {
                5 => Some("access denied; check permissions"),
                17 => Some("not same device; cross-filesystem move"),
                32 => Some("sharing violation; file is in use"),
                2 | 3 => Some("path not found"),
                112 => Some("insufficient disk space"),
                _ => None,
            };
            if let Some(h) = hint {
                msg.push_str(" (");
                msg.push_str(h);
                msg.push(')');
            }
        }
        msg.push_str(&format!(" [os code: {code}]"));
    } else if e.kind() == io::ErrorKind::PermissionDenied {
        msg.push_str(" (permission denied; check ownership and write permissions)");
    }

    msg
}

/// Returns a closure suitable for `.map_err(...)` that converts io::Error -> anyhow::Error.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}
