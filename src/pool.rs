//! Fixed-size worker pool, completion latch and occupancy counters.
//!
//! The pool is built once and shared by every relocation batch. Its size never
//! changes: bounded concurrency here limits I/O contention on the
//! unclassified folder, it is not an elastic resource.
//!
//! Occupancy is tracked with the engine's own counters instead of asking the
//! pool implementation, so any [`TaskPool`] can be substituted in tests.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use tracing::error;

use crate::errors::SortboxError;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executes submitted jobs on worker threads.
///
/// Implementations must run every submitted job exactly once; the completion
/// latch of a batch only opens after each job has run.
pub trait TaskPool: Send + Sync + fmt::Debug {
    fn execute(&self, job: Job);

    /// Number of worker threads (core and maximum size are the same).
    fn size(&self) -> usize;
}

/// rayon-backed pool with a fixed thread count and named workers
/// (`relocate-pool-1`, `relocate-pool-2`, ...).
#[derive(Debug)]
pub struct FixedPool {
    inner: rayon::ThreadPool,
    size: usize,
}

impl FixedPool {
    pub fn new(size: usize) -> Result<Self, SortboxError> {
        let size = size.max(1);
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("relocate-pool-{}", i + 1))
            .panic_handler(|_| error!("Relocation bookkeeping job panicked"))
            .build()
            .map_err(|e| SortboxError::PoolBuild(e.to_string()))?;
        Ok(Self { inner, size })
    }
}

impl TaskPool for FixedPool {
    fn execute(&self, job: Job) {
        self.inner.spawn(job);
    }

    fn size(&self) -> usize {
        self.size
    }
}

/// Counting latch: opens once `count_down` has been called `count` times.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    opened: Condvar,
}

impl CompletionLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            opened: Condvar::new(),
        }
    }

    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock().unwrap_or_else(|p| p.into_inner());
        debug_assert!(*remaining > 0, "latch counted down past zero");
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.opened.notify_all();
        }
    }

    /// Block until every expected count-down has happened. No timeout.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock().unwrap_or_else(|p| p.into_inner());
        while *remaining > 0 {
            remaining = self
                .opened
                .wait(remaining)
                .unwrap_or_else(|p| p.into_inner());
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Engine-maintained occupancy counters.
#[derive(Debug, Default)]
pub struct PoolCounters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    active: AtomicUsize,
}

impl PoolCounters {
    pub fn snapshot(&self, pool_size: usize) -> PoolSnapshot {
        PoolSnapshot {
            active: self.active.load(Ordering::SeqCst),
            submitted: self.submitted.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            pool_size,
        }
    }
}

/// Read-only view of pool occupancy at one point of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub active: usize,
    pub submitted: usize,
    pub completed: usize,
    pub pool_size: usize,
}

impl PoolSnapshot {
    /// Jobs submitted but not finished yet (queued or running).
    pub fn in_flight(&self) -> usize {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStage {
    BeforeSubmitted,
    TaskFinished,
}

impl fmt::Display for SnapshotStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotStage::BeforeSubmitted => "before_submitted",
            SnapshotStage::TaskFinished => "task_finished",
        })
    }
}

/// Finishes one job's bookkeeping when dropped, so a panicking job still
/// releases its latch slot exactly once.
struct JobGuard {
    counters: Arc<PoolCounters>,
    latch: Arc<CompletionLatch>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.completed.fetch_add(1, Ordering::SeqCst);
        self.latch.count_down();
    }
}

/// Submit `job` to `pool`, tracking it in `counters` and releasing one slot of
/// `latch` when it finishes (normally or by panic).
pub fn submit_tracked<F>(
    pool: &dyn TaskPool,
    counters: &Arc<PoolCounters>,
    latch: &Arc<CompletionLatch>,
    job: F,
) where
    F: FnOnce() + Send + 'static,
{
    counters.submitted.fetch_add(1, Ordering::SeqCst);
    let counters = Arc::clone(counters);
    let latch = Arc::clone(latch);
    pool.execute(Box::new(move || {
        counters.active.fetch_add(1, Ordering::SeqCst);
        let _guard = JobGuard { counters, latch };
        job();
    }));
}
