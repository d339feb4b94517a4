//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template if missing (unless SORTBOX_CONFIG is set).
//!
//! Notes:
//! - This module only reads/writes the config file; directory validation happens elsewhere.
//! - Unknown XML fields are rejected so misconfigurations surface early.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::paths::{
    default_config_path, default_log_path, default_mapping_path, default_operation_log_path,
    path_has_symlink_ancestor,
};
use super::{CONFIG_ENV, POOL_SIZE_DEFAULT, UNCLASSIFIED_DIR_DEFAULT, WATCH_DIR_DEFAULT};

use crate::config::types::{Config, LogLevel};
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    watch_dir: Option<String>,
    unclassified_dir: Option<String>,
    mapping_file: Option<String>,
    operation_log: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_usize_trimmed_opt")]
    pool_size: Option<usize>,
}

/// Outcome of looking for the config file at startup.
#[derive(Debug)]
pub enum LoadResult {
    /// A config file existed and parsed.
    Loaded(Box<Config>),
    /// No file existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
}

// Trims surrounding whitespace for an optional usize
fn de_usize_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<usize>().ok()))
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(p) = non_empty_path(parsed.watch_dir.as_deref()) {
        cfg.watch_dir = p;
    }
    match non_empty_path(parsed.unclassified_dir.as_deref()) {
        Some(p) => cfg.unclassified_dir = p,
        // The counted folder defaults to the watched one.
        None => cfg.unclassified_dir = cfg.watch_dir.clone(),
    }
    if let Some(p) = non_empty_path(parsed.mapping_file.as_deref()) {
        cfg.mapping_file = p;
    }
    if let Some(p) = non_empty_path(parsed.operation_log.as_deref()) {
        cfg.operation_log = p;
    }
    cfg.log_file = non_empty_path(parsed.log_file.as_deref());

    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| s.trim().parse::<LogLevel>().ok())
    {
        cfg.log_level = level;
    }

    cfg.pool_size = parsed
        .pool_size
        .filter(|n| *n > 0)
        .unwrap_or(POOL_SIZE_DEFAULT);

    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Load config.xml from `$SORTBOX_CONFIG` or the default location.
///
/// When the default file is missing a commented template is written and
/// `CreatedTemplate` is returned so the caller can tell the user to edit it.
/// An explicit `$SORTBOX_CONFIG` that does not exist is an error.
pub fn load_or_init() -> Result<LoadResult> {
    let path = default_config_path()?;
    if path.exists() {
        return Ok(LoadResult::Loaded(Box::new(load_config_from_xml_path(&path)?)));
    }
    if env::var_os(CONFIG_ENV).is_some() {
        anyhow::bail!(
            "{CONFIG_ENV} points to '{}', which does not exist",
            path.display()
        );
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path))
}

/// Create default template config file and parent directory (best-effort permissions).
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow::anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let display = |r: Result<PathBuf>, fallback: &str| {
        r.map(|p| p.display().to_string())
            .unwrap_or_else(|_| fallback.into())
    };
    let mapping = display(default_mapping_path(), "/path/to/paths.yaml");
    let oplog = display(default_operation_log_path(), "/path/to/unclassified-remaining.log");
    let log = display(default_log_path(), "/path/to/sortbox.log");

    let content = format!(
        "<!--\n  sortbox configuration (XML)\n\n    watch_dir         -> directory watched for newly created files\n    unclassified_dir  -> folder whose regular-file count is logged (defaults to watch_dir)\n    mapping_file      -> YAML table: 'Default source path' plus path codes -> target dirs\n    operation_log     -> append-only log of arrivals, moves and remaining counts\n    log_level         -> quiet | normal | info | debug\n    log_file          -> diagnostic log file (optional; stdout is always used)\n    pool_size         -> worker threads for post-move bookkeeping\n\n  CLI flags override XML values.\n-->\n<config>\n  <watch_dir>{WATCH_DIR_DEFAULT}</watch_dir>\n  <unclassified_dir>{UNCLASSIFIED_DIR_DEFAULT}</unclassified_dir>\n  <mapping_file>{mapping}</mapping_file>\n  <operation_log>{oplog}</operation_log>\n  <log_level>normal</log_level>\n  <log_file>{log}</log_file>\n  <pool_size>{POOL_SIZE_DEFAULT}</pool_size>\n</config>\n"
    );

    write_config_secure_new_0600(path, content.as_bytes())?;

    info!("Created template config at {}", path.display());
    Ok(())
}
