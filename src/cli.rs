//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --config-path wins over SORTBOX_CONFIG.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Watch a staging folder and sort files into coded target folders"
)]
pub struct Args {
    /// Config file to use instead of the default location.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config_path: Option<PathBuf>,

    /// Override the watched staging directory.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub watch_dir: Option<PathBuf>,

    /// Override the folder whose files are counted as unclassified.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub unclassified_dir: Option<PathBuf>,

    /// Override the YAML path-code mapping file.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub mapping_file: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    #[arg(long, help = "Print the config file location used by sortbox and exit")]
    pub print_config: bool,

    #[arg(long, help = "Do not start the directory watcher")]
    pub no_watch: bool,

    /// Relocate once with this path code and exit instead of starting the console.
    #[arg(long, value_name = "CODE")]
    pub code: Option<String>,

    /// List every folder below this gallery root, then exit.
    #[arg(long, value_name = "ROOT", value_hint = ValueHint::DirPath)]
    pub index_dirs: Option<PathBuf>,

    /// Write the folder list here instead of stdout (used with --index-dirs).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath, requires = "index_dirs")]
    pub index_output: Option<PathBuf>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(dir) = &self.watch_dir {
            cfg.watch_dir = dir.clone();
            // Without an explicit unclassified folder, follow the watch dir.
            if self.unclassified_dir.is_none() {
                cfg.unclassified_dir = dir.clone();
            }
        }
        if let Some(dir) = &self.unclassified_dir {
            cfg.unclassified_dir = dir.clone();
        }
        if let Some(file) = &self.mapping_file {
            cfg.mapping_file = file.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_beats_log_level() {
        let args = Args::try_parse_from(["sortbox", "--log-level", "quiet", "-d"]).unwrap();
        assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn index_output_needs_index_dirs() {
        assert!(Args::try_parse_from(["sortbox", "--index-output", "/o.txt"]).is_err());
        let args =
            Args::try_parse_from(["sortbox", "--index-dirs", "/g", "--index-output", "/o.txt"])
                .unwrap();
        assert_eq!(args.index_dirs, Some(PathBuf::from("/g")));
    }

    #[test]
    fn watch_dir_override_drags_unclassified_along() {
        let args = Args::try_parse_from(["sortbox", "--watch-dir", "/w"]).unwrap();
        let mut cfg = Config::new("/a", "/b", "/m.yaml", "/o.log");
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.watch_dir, PathBuf::from("/w"));
        assert_eq!(cfg.unclassified_dir, PathBuf::from("/w"));
        assert_eq!(cfg.mapping_file, PathBuf::from("/m.yaml"));

        let args = Args::try_parse_from([
            "sortbox",
            "--watch-dir",
            "/w",
            "--unclassified-dir",
            "/u",
        ])
        .unwrap();
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.unclassified_dir, PathBuf::from("/u"));
    }
}
