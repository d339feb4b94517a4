//! Core library for `sortbox`.
//!
//! Watches a staging folder for new files and relocates buffered files into
//! target folders addressed by short path codes:
//! - `watcher`: creation events on the staging folder drive the operation log
//! - `relocate`: recursive move of a source tree, then per-file bookkeeping on
//!   a fixed worker pool behind a completion latch
//! - `service`: path-code resolution over the YAML mapping table
//! - `config`: XML settings, defaults and validation
//! - `indexer`: flat list of every gallery folder, written to a text file

pub mod bookkeeping;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod indexer;
pub mod mapping;
pub mod oplog;
pub mod output;
pub mod platform;
pub mod pool;
pub mod relocate;
pub mod repl;
pub mod service;
pub mod shutdown;
pub mod watcher;

pub use bookkeeping::Bookkeeper;
pub use config::{
    Config, LogLevel, default_config_path, default_log_path, default_mapping_path,
    default_operation_log_path, path_has_symlink_ancestor,
};
pub use errors::SortboxError;
pub use mapping::PathMapping;
pub use oplog::OperationLog;
pub use pool::{CompletionLatch, FixedPool, PoolSnapshot, TaskPool};
pub use relocate::{OverallOutcome, RelocationEngine, RelocationOutcome, RelocationReport};
pub use repl::Repl;
pub use service::RelocationService;
pub use shutdown::ShutdownToken;
pub use watcher::DirectoryWatcher;
