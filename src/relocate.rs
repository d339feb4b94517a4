//! Recursive relocation engine.
//!
//! `relocate(source, target)` runs in three phases:
//!
//! 1. Discovery + move, single-threaded and depth-first. Every subdirectory is
//!    mirrored under the target before anything is moved into it, regular
//!    files are moved with replace-existing semantics, and a source
//!    subdirectory is removed once it has been emptied. The source root itself
//!    stays in place.
//! 2. Dispatch: one bookkeeping job per discovered file goes to the shared
//!    fixed-size pool. Moves are not parallelised because they mutate the tree
//!    being walked; only the count-and-log step is.
//! 3. Barrier: the caller blocks on a latch until every job finished, then
//!    aggregates. Any moved file makes the whole batch a success.
//!
//! I/O failures never escape: they become per-file outcomes and log lines.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, debug, error, info, warn};

use crate::bookkeeping::Bookkeeper;
use crate::errors::SortboxError;
use crate::fs_ops::{io_error_with_help, move_replacing};
use crate::pool::{
    CompletionLatch, FixedPool, PoolCounters, PoolSnapshot, SnapshotStage, TaskPool,
    submit_tracked,
};

/// Result of relocating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOutcome {
    Moved,
    NothingToMove,
    TargetInvalid,
}

/// One file to move: produced during discovery, consumed by exactly one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTask {
    pub source: PathBuf,
    pub target: PathBuf,
    pub outcome: RelocationOutcome,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallOutcome {
    /// At least one file was moved (other files may have failed).
    Success,
    /// Source missing, not a directory, empty, or no file could be moved.
    NothingFound,
    /// The batch could not start: the target root could not be created.
    IoFailure,
}

impl fmt::Display for OverallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverallOutcome::Success => "success",
            OverallOutcome::NothingFound => "nothing found",
            OverallOutcome::IoFailure => "I/O failure",
        })
    }
}

/// Coarse outcome plus the counts it hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationReport {
    pub outcome: OverallOutcome,
    pub moved: usize,
    pub failed: usize,
}

impl RelocationReport {
    fn without_tasks(outcome: OverallOutcome) -> Self {
        Self {
            outcome,
            moved: 0,
            failed: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == OverallOutcome::Success
    }
}

/// Owns the worker pool and the bookkeeping sink. Cheap to clone; clones share
/// the same pool and counters.
#[derive(Debug, Clone)]
pub struct RelocationEngine {
    pool: Arc<dyn TaskPool>,
    counters: Arc<PoolCounters>,
    bookkeeper: Bookkeeper,
}

impl RelocationEngine {
    /// Engine backed by a rayon pool of `pool_size` threads.
    pub fn new(pool_size: usize, bookkeeper: Bookkeeper) -> Result<Self, SortboxError> {
        Ok(Self::with_pool(Arc::new(FixedPool::new(pool_size)?), bookkeeper))
    }

    /// Engine backed by any pool, e.g. a deterministic one in tests.
    pub fn with_pool(pool: Arc<dyn TaskPool>, bookkeeper: Bookkeeper) -> Self {
        Self {
            pool,
            counters: Arc::new(PoolCounters::default()),
            bookkeeper,
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.counters.snapshot(self.pool.size())
    }

    /// Move everything under `source` into `target`, mirroring subdirectories.
    pub fn relocate(&self, source: &Path, target: &Path) -> RelocationReport {
        if !has_entries(source) {
            info!(source = %source.display(), "No files in source directory, returning directly");
            return RelocationReport::without_tasks(OverallOutcome::NothingFound);
        }

        if is_nested(source, target) {
            error!(
                source = %source.display(),
                target = %target.display(),
                "Target lies inside the source tree; refusing to relocate"
            );
            return RelocationReport::without_tasks(OverallOutcome::IoFailure);
        }

        if let Err(e) = fs::create_dir_all(target) {
            let err = io_error_with_help("create target directory", target)(e);
            error!(error = %err, "Target directory unusable; nothing relocated");
            return RelocationReport::without_tasks(OverallOutcome::IoFailure);
        }

        let mut tasks = Vec::new();
        relocate_tree(source, target, &mut tasks);
        let moved = tasks
            .iter()
            .filter(|t| t.outcome == RelocationOutcome::Moved)
            .count();
        let failed = tasks
            .iter()
            .filter(|t| t.outcome == RelocationOutcome::TargetInvalid)
            .count();

        let found_any = self.dispatch_and_wait(tasks);

        let outcome = if found_any {
            OverallOutcome::Success
        } else {
            if empty_result_level(failed) == Level::ERROR {
                error!(source = %source.display(), failed, "No file under source could be moved");
            } else {
                info!(source = %source.display(), "No files were found to move under source");
            }
            OverallOutcome::NothingFound
        };
        info!(%outcome, moved, failed, source = %source.display(), target = %target.display(), "Relocation finished");
        RelocationReport {
            outcome,
            moved,
            failed,
        }
    }

    /// Hand one bookkeeping job per task to the pool and block until all ran.
    /// Returns whether any job saw a moved file.
    fn dispatch_and_wait(&self, tasks: Vec<RelocationTask>) -> bool {
        let found_any = Arc::new(AtomicBool::new(false));
        let latch = Arc::new(CompletionLatch::new(tasks.len()));

        self.log_snapshot(SnapshotStage::BeforeSubmitted);

        for task in tasks {
            let keeper = self.bookkeeper.clone();
            let found_any = Arc::clone(&found_any);
            submit_tracked(self.pool.as_ref(), &self.counters, &latch, move || {
                match task.outcome {
                    RelocationOutcome::Moved => {
                        keeper.record_moved(&task.target);
                        found_any.store(true, Ordering::SeqCst);
                    }
                    RelocationOutcome::TargetInvalid => {
                        keeper.log().error(&format!(
                            "Failed to move {} -> {}; please verify that the target path is valid",
                            task.source.display(),
                            task.target.display()
                        ));
                    }
                    RelocationOutcome::NothingToMove => {}
                }
            });
        }

        latch.wait();

        self.log_snapshot(SnapshotStage::TaskFinished);
        found_any.load(Ordering::SeqCst)
    }

    fn log_snapshot(&self, stage: SnapshotStage) {
        let snap = self.snapshot();
        info!(
            %stage,
            active = snap.active,
            submitted = snap.submitted,
            completed = snap.completed,
            pool_size = snap.pool_size,
            "Worker pool occupancy"
        );
    }
}

/// An empty batch is only an error when files were there but none moved.
fn empty_result_level(failed: usize) -> Level {
    if failed > 0 { Level::ERROR } else { Level::INFO }
}

/// True if `path` is a directory with at least one entry.
fn has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// True if `inner` resolves to a path inside (or equal to) `outer`.
/// `inner` may not exist yet.
fn is_nested(outer: &Path, inner: &Path) -> bool {
    resolve_lenient(inner).starts_with(resolve_lenient(outer))
}

/// Canonicalize the deepest existing ancestor and re-attach the missing tail.
fn resolve_lenient(path: &Path) -> PathBuf {
    let mut tail = Vec::new();
    let mut current = path;
    loop {
        let probe = if current.as_os_str().is_empty() {
            Path::new(".")
        } else {
            current
        };
        if let Ok(real) = dunce::canonicalize(probe) {
            return tail.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Depth-first move of `src_dir`'s contents into `dst_dir` (which exists).
///
/// A listing failure abandons this subtree only; siblings keep going.
fn relocate_tree(src_dir: &Path, dst_dir: &Path, tasks: &mut Vec<RelocationTask>) {
    let entries = match fs::read_dir(src_dir) {
        Ok(entries) => entries,
        Err(e) => {
            let err = io_error_with_help("list directory", src_dir)(e);
            error!(error = %err, "Skipping subtree");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = io_error_with_help("read directory entry", src_dir)(e);
                error!(error = %err, "Skipping entry");
                continue;
            }
        };
        let src = entry.path();
        let dst = dst_dir.join(entry.file_name());
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                warn!(path = %src.display(), error = %e, "Cannot stat entry; skipping");
                continue;
            }
        };

        if file_type.is_dir() {
            if let Err(e) = fs::create_dir_all(&dst) {
                let err = io_error_with_help("create target directory", &dst)(e);
                error!(error = %err, "Skipping subtree");
                continue;
            }
            relocate_tree(&src, &dst, tasks);
            remove_if_empty(&src);
        } else if file_type.is_file() {
            let outcome = match move_replacing(&src, &dst) {
                Ok(()) => {
                    info!(src = %src.display(), dest = %dst.display(), "File has been moved");
                    RelocationOutcome::Moved
                }
                // Vanished between listing and moving: nothing left to do for it.
                Err(e) if !src.exists() => {
                    warn!(src = %src.display(), error = %e, "File disappeared before it could be moved");
                    RelocationOutcome::NothingToMove
                }
                Err(e) => {
                    error!(src = %src.display(), error = %e, "Failed to move file");
                    RelocationOutcome::TargetInvalid
                }
            };
            tasks.push(RelocationTask {
                source: src,
                target: dst,
                outcome,
            });
        } else {
            debug!(path = %src.display(), "Skipping non-regular entry");
        }
    }
}

/// Remove a source directory left empty by the walk; keep it if anything stayed behind.
fn remove_if_empty(dir: &Path) {
    if has_entries(dir) {
        debug!(dir = %dir.display(), "Source directory not empty after relocation; keeping it");
        return;
    }
    if let Err(e) = fs::remove_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "Failed to remove emptied source directory");
    }
}
