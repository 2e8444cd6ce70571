use super::*;
use tempfile::tempdir;

#[test]
fn init_creates_full_tree_and_defaults() {
    let dir = tempdir().unwrap();
    let outcome = init(dir.path()).unwrap();
    assert_eq!(outcome, InitOutcome::Created);

    let paths = Paths::new(dir.path());
    assert!(paths.tasks_dir().is_dir());
    assert!(paths.events_dir().is_dir());
    assert!(paths.locks_dir().is_dir());
    assert!(paths.config_path().is_file());
    assert!(paths.ids_path().is_file());
    assert!(paths.lifecycle_path().is_file());

    let config: Config = serde_json::from_slice(&fs::read(paths.config_path()).unwrap()).unwrap();
    assert_eq!(config.workflow.statuses.first().unwrap(), "backlog");
}

#[test]
fn init_is_idempotent() {
    let dir = tempdir().unwrap();
    assert_eq!(init(dir.path()).unwrap(), InitOutcome::Created);
    assert_eq!(init(dir.path()).unwrap(), InitOutcome::AlreadyInitialized);
}

#[test]
fn init_rejects_lattice_dir_as_plain_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".lattice"), b"not a directory").unwrap();
    let err = init(dir.path()).unwrap_err();
    assert!(matches!(err, LatticeError::PathIsFile(_)));
}
