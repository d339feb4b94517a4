//! Path-code lookup table.
//!
//! A flat YAML map of short codes to target directories, plus one reserved
//! key naming the default relocation source:
//!
//! ```yaml
//! Default source path: /mnt/Gallery/Buffer
//! px: /mnt/Gallery/Pixiv
//! tw: /mnt/Gallery/Twitter
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::SortboxError;

/// Reserved key holding the default relocation source.
pub const DEFAULT_SOURCE_KEY: &str = "Default source path";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapping {
    entries: BTreeMap<String, String>,
}

impl PathMapping {
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a YAML document. `origin` only labels errors.
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self, SortboxError> {
        // An empty document is an empty table, not an error.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries: BTreeMap<String, String> =
            serde_yaml::from_str(yaml).map_err(|e| SortboxError::MappingParse {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!(origin = %origin.display(), entries = entries.len(), "Loaded path mapping");
        Ok(Self { entries })
    }

    /// Read and parse the mapping file. The table is re-read on every command
    /// so edits take effect without a restart.
    pub fn from_yaml_path(path: &Path) -> Result<Self, SortboxError> {
        let yaml = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SortboxError::MappingUnavailable(path.to_path_buf()),
            _ => SortboxError::MappingParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::from_yaml_str(&yaml, path)
    }

    /// The configured default source, if present and not blank.
    pub fn default_source(&self) -> Option<&Path> {
        self.entries
            .get(DEFAULT_SOURCE_KEY)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Path::new)
    }

    /// Resolve a path code (surrounding whitespace ignored) to its target.
    pub fn resolve(&self, code: &str) -> Option<PathBuf> {
        let code = code.trim();
        if code.is_empty() || code == DEFAULT_SOURCE_KEY {
            return None;
        }
        self.entries
            .get(code)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    /// Known path codes, excluding the reserved default-source key.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|k| *k != DEFAULT_SOURCE_KEY)
    }

    pub fn len(&self) -> usize {
        self.codes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
