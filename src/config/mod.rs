//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    default_config_path, default_log_path, default_mapping_path, default_operation_log_path,
    path_has_symlink_ancestor,
};
pub use types::{Config, LogLevel};
pub use xml::{LoadResult, create_template_config, load_config_from_xml_path, load_or_init};

/// Defaults shared across submodules.
pub const WATCH_DIR_DEFAULT: &str = "/mnt/Gallery/Unclassified";
pub const UNCLASSIFIED_DIR_DEFAULT: &str = "/mnt/Gallery/Unclassified";
/// Fixed worker count used for per-file bookkeeping after a relocation batch.
pub const POOL_SIZE_DEFAULT: usize = 3;
/// Environment variable naming an explicit config.xml.
pub const CONFIG_ENV: &str = "SORTBOX_CONFIG";
