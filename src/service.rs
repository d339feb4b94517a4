//! Command-level facade over the relocation engine.
//!
//! Resolves path codes through the mapping table, checks the default source
//! and hands the pair to [`RelocationEngine::relocate`].

use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

use crate::errors::SortboxError;
use crate::mapping::PathMapping;
use crate::relocate::{RelocationEngine, RelocationReport};

/// Where the service gets its mapping table from.
#[derive(Debug, Clone)]
enum MappingSource {
    /// Re-read before every command so edits apply without a restart.
    File(PathBuf),
    Fixed(PathMapping),
}

#[derive(Debug, Clone)]
pub struct RelocationService {
    mapping: MappingSource,
    engine: RelocationEngine,
}

impl RelocationService {
    pub fn new(mapping_file: impl Into<PathBuf>, engine: RelocationEngine) -> Self {
        Self {
            mapping: MappingSource::File(mapping_file.into()),
            engine,
        }
    }

    pub fn with_mapping(mapping: PathMapping, engine: RelocationEngine) -> Self {
        Self {
            mapping: MappingSource::Fixed(mapping),
            engine,
        }
    }

    pub fn engine(&self) -> &RelocationEngine {
        &self.engine
    }

    pub fn mapping(&self) -> Result<PathMapping, SortboxError> {
        match &self.mapping {
            MappingSource::File(path) => PathMapping::from_yaml_path(path),
            MappingSource::Fixed(m) => Ok(m.clone()),
        }
    }

    /// Relocate everything under the default source into the directory mapped
    /// to `path_code`.
    pub fn run(&self, path_code: &str) -> Result<RelocationReport, SortboxError> {
        let mapping = self.mapping()?;
        let source = default_source_of(&mapping)?;
        let code = path_code.trim();
        let Some(target) = mapping.resolve(code) else {
            let err = SortboxError::UnknownPathCode(code.to_string());
            error!(code = err.code(), path_code = code, "Unknown path code");
            return Err(err);
        };

        info!(
            path_code = code,
            source = %source.display(),
            target = %target.display(),
            "Relocating"
        );
        Ok(self.engine.relocate(&source, &target))
    }

    /// Resolve a path code to its target directory without relocating.
    pub fn target_for(&self, path_code: &str) -> Result<PathBuf, SortboxError> {
        let code = path_code.trim();
        self.mapping()?
            .resolve(code)
            .ok_or_else(|| SortboxError::UnknownPathCode(code.to_string()))
    }

    /// The configured default source directory.
    pub fn default_source(&self) -> Result<PathBuf, SortboxError> {
        default_source_of(&self.mapping()?)
    }

    /// Names of the entries directly inside the default source, sorted.
    pub fn check_source(&self) -> Result<Vec<String>, SortboxError> {
        let source = self.default_source()?;
        if !source.is_dir() {
            return Err(SortboxError::InvalidDirectory(source));
        }
        Ok(list_entry_names(&source))
    }
}

fn default_source_of(mapping: &PathMapping) -> Result<PathBuf, SortboxError> {
    match mapping.default_source() {
        Some(p) => Ok(p.to_path_buf()),
        None => {
            let err = SortboxError::MissingDefaultSource;
            error!(code = err.code(), "{err}");
            Err(err)
        }
    }
}

fn list_entry_names(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}
