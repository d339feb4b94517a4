//! Arrival watcher for the staging directory.
//!
//! One `notify` subscription per watcher, drained on a dedicated thread. Every
//! entry created in, or renamed into, the directory triggers the count-and-log
//! step of the [`Bookkeeper`].

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::bookkeeping::Bookkeeper;
use crate::errors::SortboxError;
use crate::shutdown::ShutdownToken;

/// Upper bound on how long the event loop waits before re-checking the token.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

const THREAD_NAME: &str = "sortbox-watcher";

#[derive(Debug)]
pub struct DirectoryWatcher {
    directory: PathBuf,
    token: ShutdownToken,
    handle: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Subscribe to arrivals in `directory` (non-recursive) and start
    /// the event loop. Fails if the subscription cannot be created.
    pub fn start(
        directory: impl Into<PathBuf>,
        bookkeeper: Bookkeeper,
        token: ShutdownToken,
    ) -> Result<Self, SortboxError> {
        let directory = directory.into();
        let setup_err = |reason: String| SortboxError::WatchSetup {
            path: directory.clone(),
            reason,
        };

        if !directory.is_dir() {
            return Err(setup_err("not an existing directory".into()));
        }

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(tx).map_err(|e| setup_err(e.to_string()))?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| setup_err(e.to_string()))?;

        let loop_dir = directory.clone();
        let loop_token = token.clone();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || event_loop(watcher, rx, &loop_dir, &bookkeeper, &loop_token))
            .map_err(|e| setup_err(format!("failed to spawn watcher thread: {e}")))?;

        info!(dir = %directory.display(), "Watching for new files");
        Ok(Self {
            directory,
            token,
            handle: Some(handle),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// True while the event loop thread has not exited.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the event loop and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!(dir = %self.directory.display(), "Watcher thread panicked");
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drain events until cancelled, the directory disappears, or the channel
/// disconnects. `watcher` is held here so the subscription lives exactly as
/// long as the loop.
fn event_loop(
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    dir: &Path,
    bookkeeper: &Bookkeeper,
    token: &ShutdownToken,
) {
    let _subscription = watcher;
    loop {
        if token.is_cancelled() {
            debug!(dir = %dir.display(), "Watcher cancelled");
            return;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => handle_event(&event, bookkeeper),
            Ok(Err(e)) => warn!(dir = %dir.display(), error = %e, "Watch backend reported an error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                error!(dir = %dir.display(), "Watch event channel disconnected; stopping watcher");
                return;
            }
        }
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Watched directory is gone; stopping watcher");
            return;
        }
    }
}

/// Paths that newly appeared in the watched directory: created entries and
/// entries renamed into it.
///
/// inotify reports a rename with a `To` event and, when both ends were seen,
/// an extra `Both` event for the same move. Only `To` (and the direction-less
/// `Any` of other backends) counts, so each arrival is logged once.
fn arrivals(event: &Event) -> &[PathBuf] {
    if event.need_rescan() {
        return &[];
    }
    match event.kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => &event.paths,
        _ => &[],
    }
}

fn handle_event(event: &Event, bookkeeper: &Bookkeeper) {
    for path in arrivals(event) {
        // The entry may already have been moved on by the time we look.
        if path.exists() {
            bookkeeper.record_arrival(path);
        } else {
            debug!(path = %path.display(), "New entry vanished before counting");
        }
    }
}
