//! Config validation logic.
//! Verifies the watched directory, the counted folder, the mapping file and the
//! operation log location before any long-running component starts.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::types::Config;

impl Config {
    /// Validate existence and readability of the configured paths.
    ///
    /// The watched directory must exist up front: the subscription cannot be
    /// created without it. A missing unclassified folder is only a warning,
    /// because the count step re-checks it for every event.
    pub fn validate(&self) -> Result<()> {
        ensure_dir_exists_and_is_dir(&self.watch_dir, "watch_dir")?;
        ensure_readable(&self.watch_dir, "watch_dir")?;

        if !self.unclassified_dir.is_dir() {
            warn!(
                "unclassified_dir is missing or not a directory: {}; counts will be skipped",
                self.unclassified_dir.display()
            );
        }

        if !self.mapping_file.is_file() {
            warn!(
                "mapping_file not found: {}; relocation commands will fail until it exists",
                self.mapping_file.display()
            );
        }

        if self.pool_size == 0 {
            bail!("pool_size must be at least 1");
        }

        if let Some(parent) = self.operation_log.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create operation log directory '{}'", parent.display())
            })?;
        }

        info!(
            "Config validated: watch='{}' unclassified='{}' mapping='{}' operation_log='{}' pool_size={}",
            self.watch_dir.display(),
            self.unclassified_dir.display(),
            self.mapping_file.display(),
            self.operation_log.display(),
            self.pool_size
        );
        Ok(())
    }

    /// Resolve symlinks in directory settings so log lines and comparisons are stable.
    pub fn normalize(&mut self) {
        if let Ok(p) = dunce::canonicalize(&self.watch_dir) {
            self.watch_dir = p;
        }
        if let Ok(p) = dunce::canonicalize(&self.unclassified_dir) {
            self.unclassified_dir = p;
        }
    }
}

/// Ensure path exists and is a directory; emit clear errors with path context.
fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

/// Ensure directory is readable by attempting to open its entries.
fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read {name} directory '{}'; check permissions", path.display())
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_watch_dir_fails() {
        let td = tempdir().unwrap();
        let cfg = Config::new(
            td.path().join("nope"),
            td.path(),
            td.path().join("paths.yaml"),
            td.path().join("op.log"),
        );
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("watch_dir does not exist"));
    }

    #[test]
    fn creates_operation_log_parent() {
        let td = tempdir().unwrap();
        let cfg = Config::new(
            td.path(),
            td.path(),
            td.path().join("paths.yaml"),
            td.path().join("logs").join("op.log"),
        );
        cfg.validate().unwrap();
        assert!(td.path().join("logs").is_dir());
    }
}
