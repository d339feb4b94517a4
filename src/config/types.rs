//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{POOL_SIZE_DEFAULT, UNCLASSIFIED_DIR_DEFAULT, WATCH_DIR_DEFAULT};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory subscribed to for creation events
    pub watch_dir: PathBuf,
    /// Folder whose regular-file count is logged as the remaining work
    pub unclassified_dir: PathBuf,
    /// YAML table mapping path codes to target directories
    pub mapping_file: PathBuf,
    /// Append-only operation log (file arrivals, moves, counts)
    pub operation_log: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a diagnostic log file
    pub log_file: Option<PathBuf>,
    /// Worker threads used for post-move bookkeeping
    pub pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from(WATCH_DIR_DEFAULT),
            unclassified_dir: PathBuf::from(UNCLASSIFIED_DIR_DEFAULT),
            mapping_file: paths::default_mapping_path()
                .unwrap_or_else(|_| PathBuf::from("paths.yaml")),
            operation_log: paths::default_operation_log_path()
                .unwrap_or_else(|_| PathBuf::from("unclassified-remaining.log")),
            log_level: LogLevel::Normal,
            log_file: None,
            pool_size: POOL_SIZE_DEFAULT,
        }
    }
}

impl Config {
    /// Construct a Config with explicit directories; other fields use defaults.
    pub fn new(
        watch_dir: impl Into<PathBuf>,
        unclassified_dir: impl Into<PathBuf>,
        mapping_file: impl Into<PathBuf>,
        operation_log: impl Into<PathBuf>,
    ) -> Self {
        Self {
            watch_dir: watch_dir.into(),
            unclassified_dir: unclassified_dir.into(),
            mapping_file: mapping_file.into(),
            operation_log: operation_log.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_aliases() {
        assert_eq!(LogLevel::parse("TRACE"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("none"), Some(LogLevel::Quiet));
        assert_eq!("verbose".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn default_pool_is_three_workers() {
        assert_eq!(Config::default().pool_size, 3);
    }
}
