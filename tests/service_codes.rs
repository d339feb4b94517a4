use assert_fs::prelude::*;
use std::fs;
use std::sync::Arc;

use sortbox::{
    Bookkeeper, OperationLog, OverallOutcome, RelocationEngine, RelocationService, SortboxError,
};

fn service_with_yaml(td: &assert_fs::TempDir, yaml: &str) -> RelocationService {
    let mapping = td.child("paths.yaml");
    mapping.write_str(yaml).unwrap();
    let log = Arc::new(OperationLog::new(td.path().join("ops.log")));
    let engine = RelocationEngine::new(3, Bookkeeper::new(td.path(), log)).unwrap();
    RelocationService::new(mapping.path(), engine)
}

#[test]
fn known_code_relocates_default_source() {
    let td = assert_fs::TempDir::new().unwrap();
    let buffer = td.child("buffer");
    buffer.child("a.png").write_str("a").unwrap();
    let target = td.path().join("pixiv");
    let yaml = format!(
        "Default source path: {}\npx: {}\n",
        buffer.path().display(),
        target.display()
    );
    let svc = service_with_yaml(&td, &yaml);

    let report = svc.run(" px ").unwrap();
    assert_eq!(report.outcome, OverallOutcome::Success);
    assert!(target.join("a.png").is_file());
}

#[test]
fn unknown_code_changes_nothing() {
    let td = assert_fs::TempDir::new().unwrap();
    let buffer = td.child("buffer");
    buffer.child("a.png").write_str("a").unwrap();
    let yaml = format!(
        "Default source path: {}\npx: {}\n",
        buffer.path().display(),
        td.path().join("pixiv").display()
    );
    let svc = service_with_yaml(&td, &yaml);

    let err = svc.run("zz").unwrap_err();
    assert!(matches!(err, SortboxError::UnknownPathCode(ref c) if c == "zz"));
    assert!(buffer.path().join("a.png").is_file());
    assert!(!td.path().join("pixiv").exists());
    assert!(!td.path().join("ops.log").exists());
}

#[test]
fn mapping_edits_apply_to_the_next_command() {
    let td = assert_fs::TempDir::new().unwrap();
    let buffer = td.child("buffer");
    buffer.create_dir_all().unwrap();
    let svc = service_with_yaml(&td, &format!("Default source path: {}\n", buffer.path().display()));
    assert!(matches!(svc.target_for("tw"), Err(SortboxError::UnknownPathCode(_))));

    fs::write(
        td.path().join("paths.yaml"),
        format!(
            "Default source path: {}\ntw: /somewhere\n",
            buffer.path().display()
        ),
    )
    .unwrap();
    assert_eq!(svc.target_for("tw").unwrap(), std::path::PathBuf::from("/somewhere"));
}

#[test]
fn missing_mapping_file_is_reported() {
    let td = assert_fs::TempDir::new().unwrap();
    let log = Arc::new(OperationLog::new(td.path().join("ops.log")));
    let engine = RelocationEngine::new(1, Bookkeeper::new(td.path(), log)).unwrap();
    let svc = RelocationService::new(td.path().join("nope.yaml"), engine);
    let err = svc.run("px").unwrap_err();
    assert!(matches!(err, SortboxError::MappingUnavailable(_)));
    assert_eq!(err.code(), 20);
}
