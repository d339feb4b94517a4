//! Typed error definitions for sortbox.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortboxError {
    #[error("Cannot watch directory {path}: {reason}")]
    WatchSetup { path: PathBuf, reason: String },

    #[error("Path mapping file unavailable: {0}")]
    MappingUnavailable(PathBuf),

    #[error("Path mapping file {path} is malformed: {reason}")]
    MappingParse { path: PathBuf, reason: String },

    #[error("Default source path is missing from the path mapping")]
    MissingDefaultSource,

    #[error("Path code '{0}' does not match any configured target")]
    UnknownPathCode(String),

    #[error("Failed to build worker pool: {0}")]
    PoolBuild(String),

    #[error("Not a directory: {0}")]
    InvalidDirectory(PathBuf),

    #[error("Failed to open folder {path}: {reason}")]
    OpenFolder { path: PathBuf, reason: String },
}

impl SortboxError {
    /// Stable numeric code for logs and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            SortboxError::WatchSetup { .. } => 10,
            SortboxError::MappingUnavailable(_) => 20,
            SortboxError::MappingParse { .. } => 21,
            SortboxError::MissingDefaultSource => 22,
            SortboxError::UnknownPathCode(_) => 23,
            SortboxError::PoolBuild(_) => 30,
            SortboxError::InvalidDirectory(_) => 40,
            SortboxError::OpenFolder { .. } => 50,
        }
    }
}
