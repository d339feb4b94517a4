use assert_fs::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sortbox::pool::Job;
use sortbox::{
    Bookkeeper, OperationLog, OverallOutcome, RelocationEngine, TaskPool,
};

fn engine_in(root: &Path) -> RelocationEngine {
    let unclassified = root.join("unclassified");
    fs::create_dir_all(&unclassified).unwrap();
    let log = Arc::new(OperationLog::new(root.join("ops.log")));
    RelocationEngine::new(3, Bookkeeper::new(unclassified, log)).unwrap()
}

fn oplog_lines(root: &Path) -> Vec<String> {
    fs::read_to_string(root.join("ops.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn nested_tree_is_mirrored_and_source_root_kept() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    src.child("top.png").write_str("top").unwrap();
    src.child("album/one.png").write_str("one").unwrap();
    src.child("album/deeper/two.png").write_str("two").unwrap();
    let dst = td.child("pixiv");

    let engine = engine_in(td.path());
    let report = engine.relocate(src.path(), dst.path());

    assert_eq!(report.outcome, OverallOutcome::Success);
    assert_eq!(report.moved, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(fs::read_to_string(dst.path().join("top.png")).unwrap(), "top");
    assert_eq!(fs::read_to_string(dst.path().join("album/one.png")).unwrap(), "one");
    assert_eq!(
        fs::read_to_string(dst.path().join("album/deeper/two.png")).unwrap(),
        "two"
    );
    assert!(src.path().is_dir(), "source root must survive");
    assert!(!src.path().join("album").exists(), "emptied subtree is pruned");

    let moved_lines = oplog_lines(td.path())
        .into_iter()
        .filter(|l| l.contains("has/have been moved"))
        .count();
    assert_eq!(moved_lines, 3);
}

#[test]
fn missing_or_empty_source_touches_nothing() {
    let td = assert_fs::TempDir::new().unwrap();
    let engine = engine_in(td.path());

    let dst = td.path().join("never-created");
    let report = engine.relocate(&td.path().join("absent"), &dst);
    assert_eq!(report.outcome, OverallOutcome::NothingFound);
    assert!(!dst.exists());

    let empty = td.child("empty");
    empty.create_dir_all().unwrap();
    let report = engine.relocate(empty.path(), &dst);
    assert_eq!(report.outcome, OverallOutcome::NothingFound);
    assert!(!dst.exists());

    assert_eq!(engine.snapshot().submitted, 0);
}

#[test]
fn second_run_finds_nothing() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    src.child("a.png").write_str("a").unwrap();
    let dst = td.child("target");
    let engine = engine_in(td.path());

    assert!(engine.relocate(src.path(), dst.path()).is_success());
    let again = engine.relocate(src.path(), dst.path());
    assert_eq!(again.outcome, OverallOutcome::NothingFound);
    assert!(dst.path().join("a.png").is_file());
}

#[test]
fn existing_target_file_is_replaced() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    src.child("a.png").write_str("new").unwrap();
    let dst = td.child("target");
    dst.child("a.png").write_str("old").unwrap();

    let report = engine_in(td.path()).relocate(src.path(), dst.path());
    assert!(report.is_success());
    assert_eq!(fs::read_to_string(dst.path().join("a.png")).unwrap(), "new");
}

#[test]
fn one_good_file_makes_the_batch_a_success() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    src.child("good.png").write_str("g").unwrap();
    src.child("clash.png").write_str("c").unwrap();
    let dst = td.child("target");
    // A non-empty directory where the file should land cannot be replaced.
    dst.child("clash.png/keep.txt").write_str("k").unwrap();

    let report = engine_in(td.path()).relocate(src.path(), dst.path());
    assert_eq!(report.outcome, OverallOutcome::Success);
    assert_eq!(report.moved, 1);
    assert_eq!(report.failed, 1);
    assert!(dst.path().join("good.png").is_file());
    assert!(src.path().join("clash.png").is_file());

    let lines = oplog_lines(td.path());
    assert!(lines.iter().any(|l| l.contains(" ERROR - Failed to move")));
}

#[test]
fn target_inside_source_is_refused() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    src.child("a.png").write_str("a").unwrap();

    let report = engine_in(td.path()).relocate(src.path(), &src.path().join("sorted"));
    assert_eq!(report.outcome, OverallOutcome::IoFailure);
    assert!(src.path().join("a.png").is_file());
    assert!(!src.path().join("sorted").exists());
}

/// Runs every job on its own thread after a fixed delay.
#[derive(Debug)]
struct DelayedPool {
    delay: Duration,
}

impl TaskPool for DelayedPool {
    fn execute(&self, job: Job) {
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            job();
        });
    }

    fn size(&self) -> usize {
        3
    }
}

#[test]
fn relocate_returns_only_after_every_job_finished() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("buffer");
    for i in 0..4 {
        src.child(format!("{i}.png")).write_str("x").unwrap();
    }
    let unclassified = td.path().join("unclassified");
    fs::create_dir_all(&unclassified).unwrap();
    let log = Arc::new(OperationLog::new(td.path().join("ops.log")));
    let pool = Arc::new(DelayedPool {
        delay: Duration::from_millis(300),
    });
    let engine = RelocationEngine::with_pool(pool, Bookkeeper::new(unclassified, log));

    let started = Instant::now();
    let report = engine.relocate(src.path(), &td.path().join("target"));
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(report.is_success());

    // Every job logged before relocate returned.
    assert_eq!(oplog_lines(td.path()).len(), 4);
    let snap = engine.snapshot();
    assert_eq!(snap.submitted, 4);
    assert_eq!(snap.completed, 4);
    assert_eq!(snap.active, 0);
    assert_eq!(snap.pool_size, 3);
}
