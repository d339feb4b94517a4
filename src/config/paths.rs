//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log/mapping paths and detects symlinked ancestors.

use anyhow::{Result, anyhow};
use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

fn app_config_dir() -> Result<PathBuf> {
    if let Some(base) = config_dir() {
        return Ok(base.join("sortbox"));
    }
    env::var("HOME")
        .map(|h| PathBuf::from(h).join(".config").join("sortbox"))
        .map_err(|_| anyhow!("cannot determine a config directory (no HOME)"))
}

fn app_data_dir() -> Result<PathBuf> {
    if let Some(base) = data_dir() {
        return Ok(base.join("sortbox"));
    }
    env::var("HOME")
        .map(|h| PathBuf::from(h).join(".local").join("share").join("sortbox"))
        .map_err(|_| anyhow!("cannot determine a data directory (no HOME)"))
}

/// Config path: `$SORTBOX_CONFIG` when set (relative values resolve against the
/// current directory), otherwise `<config_dir>/sortbox/config.xml`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV) {
        let p = PathBuf::from(p);
        if p.is_absolute() {
            return Ok(p);
        }
        return Ok(env::current_dir()?.join(p));
    }
    Ok(app_config_dir()?.join("config.xml"))
}

/// Default YAML mapping table, next to config.xml.
pub fn default_mapping_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join("paths.yaml"))
}

/// Default diagnostic log file path (data dir).
pub fn default_log_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("sortbox.log"))
}

/// Default append-only operation log.
pub fn default_operation_log_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("unclassified-remaining.log"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
