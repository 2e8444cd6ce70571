use super::*;
use crate::init::init;
use crate::write_pipeline::write_task_event;
use lattice_core::{BuiltinEventKind, Config, EventSpec, FakeClock, SequentialIdGen};
use std::sync::Arc;
use tempfile::tempdir;

fn actor() -> Actor {
    Actor::parse("human:alice").unwrap()
}

fn setup() -> (tempfile::TempDir, Context, Paths, LockManager) {
    let dir = tempdir().unwrap();
    init(dir.path()).unwrap();
    let paths = Paths::new(dir.path());
    let locks = LockManager::new(paths.locks_dir());
    let ctx = Context::new(
        dir.path(),
        Config::default(),
        Arc::new(FakeClock::default()),
        Arc::new(SequentialIdGen::new()),
    );
    (dir, ctx, paths, locks)
}

fn create_spec(title: &str) -> EventSpec {
    EventSpec::builtin(
        BuiltinEventKind::TaskCreated {
            title: title.to_string(),
            description: None,
            status: "backlog".into(),
            priority: None,
            urgency: None,
            task_type: None,
            tags: Vec::new(),
            assigned_to: None,
            custom_fields: Default::default(),
        },
        actor(),
    )
}

#[test]
fn s6_archive_then_unarchive_moves_files_and_logs_both_events() {
    let (_dir, ctx, paths, locks) = setup();
    let task_id = TaskId::new("task_A");
    write_task_event(&ctx, &paths, &locks, &task_id, vec![create_spec("Fix login")]).unwrap();
    std::fs::write(paths.task_notes_path(&task_id), "notes").unwrap();

    let archived = archive(&ctx, &paths, &locks, &task_id, actor()).unwrap();
    assert!(archived.archived);
    assert!(!paths.task_snapshot_path(&task_id).is_file());
    assert!(!paths.task_events_path(&task_id).is_file());
    assert!(!paths.task_notes_path(&task_id).is_file());
    assert!(paths.archive_task_snapshot_path(&task_id).is_file());
    assert!(paths.archive_task_events_path(&task_id).is_file());
    assert!(paths.archive_task_notes_path(&task_id).is_file());

    let unarchived = unarchive(&ctx, &paths, &locks, &task_id, actor()).unwrap();
    assert!(!unarchived.archived);
    assert!(paths.task_snapshot_path(&task_id).is_file());
    assert!(paths.task_events_path(&task_id).is_file());
    assert!(paths.task_notes_path(&task_id).is_file());
    assert!(!paths.archive_task_snapshot_path(&task_id).is_file());

    let log = std::fs::read_to_string(paths.task_events_path(&task_id)).unwrap();
    let types: Vec<String> = log
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["type"]
            .as_str()
            .unwrap()
            .to_string())
        .collect();
    assert_eq!(
        types,
        vec!["task_created", "task_archived", "task_unarchived"]
    );
}

#[test]
fn archive_does_not_move_artifacts() {
    let (_dir, ctx, paths, locks) = setup();
    let task_id = TaskId::new("task_A");
    write_task_event(&ctx, &paths, &locks, &task_id, vec![create_spec("Fix login")]).unwrap();

    let artifact_id = lattice_core::ArtifactId::new("art_001");
    std::fs::create_dir_all(paths.artifacts_meta_dir()).unwrap();
    std::fs::write(paths.artifact_meta_path(&artifact_id), "{}").unwrap();

    archive(&ctx, &paths, &locks, &task_id, actor()).unwrap();

    assert!(paths.artifact_meta_path(&artifact_id).is_file());
}
