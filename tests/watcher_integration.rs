use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sortbox::{Bookkeeper, DirectoryWatcher, OperationLog, ShutdownToken};

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn wait_for_lines(path: &Path, at_least: usize, timeout: Duration) -> Vec<String> {
    let deadline = Instant::now() + timeout;
    loop {
        let lines = read_lines(path);
        if lines.len() >= at_least || Instant::now() >= deadline {
            return lines;
        }
        thread::sleep(Duration::from_millis(25));
    }
}

#[test]
fn new_file_logs_one_line_with_updated_count() {
    let td = tempfile::tempdir().unwrap();
    let staging = td.path().join("staging");
    fs::create_dir_all(&staging).unwrap();
    for i in 0..4 {
        fs::write(staging.join(format!("old-{i}.png")), b"x").unwrap();
    }
    let log_path = td.path().join("ops.log");
    let keeper = Bookkeeper::new(&staging, Arc::new(OperationLog::new(&log_path)));
    let watcher = DirectoryWatcher::start(&staging, keeper, ShutdownToken::new()).unwrap();

    // Give the backend a moment to arm the subscription.
    thread::sleep(Duration::from_millis(200));
    fs::write(staging.join("fresh.png"), b"new").unwrap();

    let lines = wait_for_lines(&log_path, 1, Duration::from_secs(5));
    assert!(!lines.is_empty(), "no operation log line appeared");
    assert!(
        lines[0].ends_with("INFO - New files added: fresh.png; Remaining unclassified images: 5"),
        "unexpected line: {}",
        lines[0]
    );
    assert!(lines[0].contains("Thread: [sortbox-watcher]"));

    thread::sleep(Duration::from_millis(300));
    assert_eq!(read_lines(&log_path).len(), 1);

    watcher.stop();
}

#[test]
fn file_moved_in_from_a_sibling_folder_is_counted_once() {
    let td = tempfile::tempdir().unwrap();
    let staging = td.path().join("staging");
    let downloads = td.path().join("downloads");
    fs::create_dir_all(&staging).unwrap();
    fs::create_dir_all(&downloads).unwrap();
    for i in 0..2 {
        fs::write(staging.join(format!("old-{i}.png")), b"x").unwrap();
    }
    fs::write(downloads.join("img.png"), b"img").unwrap();
    let log_path = td.path().join("ops.log");
    let keeper = Bookkeeper::new(&staging, Arc::new(OperationLog::new(&log_path)));
    let watcher = DirectoryWatcher::start(&staging, keeper, ShutdownToken::new()).unwrap();

    thread::sleep(Duration::from_millis(200));
    fs::rename(downloads.join("img.png"), staging.join("img.png")).unwrap();

    let lines = wait_for_lines(&log_path, 1, Duration::from_secs(5));
    assert!(!lines.is_empty(), "no operation log line appeared");
    assert!(
        lines[0].ends_with("New files added: img.png; Remaining unclassified images: 3"),
        "unexpected line: {}",
        lines[0]
    );

    thread::sleep(Duration::from_millis(300));
    assert_eq!(read_lines(&log_path).len(), 1);

    watcher.stop();
}

#[test]
fn rename_inside_the_folder_is_counted_once() {
    let td = tempfile::tempdir().unwrap();
    let staging = td.path().join("staging");
    fs::create_dir_all(&staging).unwrap();
    let log_path = td.path().join("ops.log");
    let keeper = Bookkeeper::new(&staging, Arc::new(OperationLog::new(&log_path)));
    fs::write(staging.join("img.png.part"), b"partial").unwrap();
    let watcher = DirectoryWatcher::start(&staging, keeper, ShutdownToken::new()).unwrap();

    thread::sleep(Duration::from_millis(200));
    fs::rename(staging.join("img.png.part"), staging.join("img.png")).unwrap();

    let lines = wait_for_lines(&log_path, 1, Duration::from_secs(5));
    assert!(!lines.is_empty(), "no operation log line appeared");
    assert!(lines[0].contains("New files added: img.png;"), "unexpected line: {}", lines[0]);

    thread::sleep(Duration::from_millis(300));
    assert_eq!(read_lines(&log_path).len(), 1);

    watcher.stop();
}

#[test]
fn dropping_the_watcher_stops_it() {
    let td = tempfile::tempdir().unwrap();
    let log_path = td.path().join("ops.log");
    let keeper = Bookkeeper::new(td.path(), Arc::new(OperationLog::new(&log_path)));
    let token = ShutdownToken::new();
    {
        let watcher = DirectoryWatcher::start(td.path(), keeper, token.clone()).unwrap();
        assert!(watcher.is_running());
        assert_eq!(watcher.directory(), td.path());
    }
    assert!(token.is_cancelled());
}

#[test]
fn vanished_directory_ends_the_loop() {
    let td = tempfile::tempdir().unwrap();
    let staging = td.path().join("staging");
    fs::create_dir_all(&staging).unwrap();
    let keeper = Bookkeeper::new(
        &staging,
        Arc::new(OperationLog::new(td.path().join("ops.log"))),
    );
    let watcher = DirectoryWatcher::start(&staging, keeper, ShutdownToken::new()).unwrap();
    fs::remove_dir(&staging).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while watcher.is_running() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(25));
    }
    assert!(!watcher.is_running());
}
