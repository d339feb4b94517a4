//! Count-and-log step shared by the directory watcher and the relocation pool.
//!
//! Every call re-lists the unclassified folder; the count is never cached
//! because files arrive and leave between events.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use crate::fs_ops::count_regular_files;
use crate::oplog::OperationLog;

#[derive(Debug, Clone)]
pub struct Bookkeeper {
    unclassified_dir: PathBuf,
    log: Arc<OperationLog>,
}

impl Bookkeeper {
    pub fn new(unclassified_dir: impl Into<PathBuf>, log: Arc<OperationLog>) -> Self {
        Self {
            unclassified_dir: unclassified_dir.into(),
            log,
        }
    }

    pub fn unclassified_dir(&self) -> &Path {
        &self.unclassified_dir
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Current number of regular files in the unclassified folder.
    ///
    /// Returns None (after logging an error) when the folder is gone, is not a
    /// directory, or cannot be listed.
    pub fn remaining(&self) -> Option<usize> {
        let dir = &self.unclassified_dir;
        if !dir.is_dir() {
            error!(dir = %dir.display(), "Unclassified folder does not exist or is not a directory");
            self.log.error(&format!(
                "Unclassified folder does not exist or is not a directory: {}",
                dir.display()
            ));
            return None;
        }
        match count_regular_files(dir) {
            Ok(n) => Some(n),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Failed to list unclassified folder");
                self.log.error(&format!(
                    "Failed to list unclassified folder {}: {e}",
                    dir.display()
                ));
                None
            }
        }
    }

    /// Watcher side: a new entry showed up.
    pub fn record_arrival(&self, file: &Path) {
        let Some(count) = self.remaining() else {
            return;
        };
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        debug!(file = %name, count, "recording arrival");
        self.log.info(&format!(
            "New files added: {name}; Remaining unclassified images: {count}"
        ));
    }

    /// Pool side: one file reached its target.
    pub fn record_moved(&self, dest: &Path) {
        let Some(count) = self.remaining() else {
            return;
        };
        debug!(dest = %dest.display(), count, "recording move");
        self.log.info(&format!(
            "File(s) has/have been moved; Remaining unclassified images: {count}"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, Bookkeeper) {
        let td = tempdir().unwrap();
        let unclassified = td.path().join("unclassified");
        fs::create_dir_all(&unclassified).unwrap();
        let log = Arc::new(OperationLog::new(td.path().join("op.log")));
        (td, Bookkeeper::new(unclassified, log))
    }

    #[test]
    fn arrival_line_carries_name_and_fresh_count() {
        let (_td, keeper) = setup();
        for i in 0..3 {
            fs::write(keeper.unclassified_dir().join(format!("{i}.png")), b"x").unwrap();
        }
        keeper.record_arrival(&keeper.unclassified_dir().join("2.png"));
        fs::write(keeper.unclassified_dir().join("3.png"), b"x").unwrap();
        keeper.record_arrival(&keeper.unclassified_dir().join("3.png"));

        let contents = fs::read_to_string(keeper.log().path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO - New files added: 2.png; Remaining unclassified images: 3"));
        assert!(lines[1].ends_with("Remaining unclassified images: 4"));
    }

    #[test]
    fn missing_folder_logs_error_and_skips_count() {
        let (_td, keeper) = setup();
        fs::remove_dir(keeper.unclassified_dir()).unwrap();
        assert_eq!(keeper.remaining(), None);
        keeper.record_moved(Path::new("/t/a.png"));
        let contents = fs::read_to_string(keeper.log().path()).unwrap();
        assert!(contents.lines().all(|l| l.contains(" ERROR - ")));
        assert!(!contents.contains("has/have been moved"));
    }
}
