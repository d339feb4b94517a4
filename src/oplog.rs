//! Append-only operation log.
//!
//! One plain-text line per significant event (file arrived, file moved,
//! remaining unclassified count), independent of the diagnostic `tracing`
//! output:
//!
//! ```text
//! 2024-09-08 17:14:02 Thread: [relocate-pool-2] (ID: 14) INFO - File(s) has/have been moved; Remaining unclassified images: 41
//! ```
//!
//! No rotation and no structured fields. Appends from the watcher thread and
//! the worker pool are serialised so lines never interleave.

use chrono::Local;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use tracing::warn;

use crate::platform::open_log_file_secure_append;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        })
    }
}

#[derive(Debug)]
pub struct OperationLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: &str) {
        self.append(Severity::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.append(Severity::Error, message);
    }

    /// Append one line. Failures are reported through tracing and swallowed:
    /// a broken log must not break a relocation or the watcher loop.
    pub fn append(&self, severity: Severity, message: &str) {
        let line = format_line(severity, message);
        // A poisoned lock only means another writer panicked mid-append.
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let result = open_log_file_secure_append(&self.path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to append operation log line");
        }
    }
}

fn thread_label() -> String {
    let current = thread::current();
    let name = current.name().unwrap_or("unnamed");
    let id = format!("{:?}", current.id());
    let id = id
        .trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .to_string();
    format!("Thread: [{name}] (ID: {id})")
}

fn format_line(severity: Severity, message: &str) -> String {
    format!(
        "{} {} {} - {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        thread_label(),
        severity,
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn line_has_timestamp_thread_and_level() {
        let line = format_line(Severity::Error, "boom");
        assert!(line.ends_with(" ERROR - boom\n"));
        assert!(line.contains("Thread: ["));
        // yyyy-mm-dd HH:MM:SS
        assert_eq!(line.as_bytes()[4], b'-');
        assert_eq!(line.as_bytes()[13], b':');
    }

    #[test]
    fn concurrent_appends_do_not_interleave() {
        let td = tempdir().unwrap();
        let log = Arc::new(OperationLog::new(td.path().join("op.log")));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                thread::Builder::new()
                    .name(format!("writer-{i}"))
                    .spawn(move || {
                        for j in 0..25 {
                            log.info(&format!("entry {i}-{j}"));
                        }
                    })
                    .unwrap()
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.contains(" INFO - entry ")));
        assert!(lines.iter().all(|l| l.contains("Thread: [writer-")));
    }
}
