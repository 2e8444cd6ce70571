use super::*;
use crate::paths::Paths;
use tempfile::tempdir;

fn setup() -> (tempfile::TempDir, Paths, LockManager) {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".lattice")).unwrap();
    let paths = Paths::new(dir.path());
    let locks = LockManager::new(paths.locks_dir());
    (dir, paths, locks)
}

#[test]
fn allocates_contiguous_ids_per_prefix() {
    let (_dir, paths, locks) = setup();
    let a = TaskId::new("task_a");
    let b = TaskId::new("task_b");

    let first = allocate_short_id(&paths, &locks, "LAT", &a).unwrap();
    let second = allocate_short_id(&paths, &locks, "LAT", &b).unwrap();

    assert_eq!(first, "LAT-1");
    assert_eq!(second, "LAT-2");

    let index = ShortIdIndex::load(&paths).unwrap();
    assert_eq!(index.next_seqs.get("LAT"), Some(&3));
}

#[test]
fn resolve_handles_short_id_and_bare_task_id() {
    let (_dir, paths, locks) = setup();
    let task_id = TaskId::new("task_a");
    allocate_short_id(&paths, &locks, "LAT", &task_id).unwrap();

    assert_eq!(resolve(&paths, "LAT-1").unwrap(), Some(task_id.clone()));
    assert_eq!(
        resolve(&paths, task_id.as_str()).unwrap(),
        Some(task_id.clone())
    );
    assert_eq!(resolve(&paths, "LAT-99").unwrap(), None);
}

#[test]
fn concurrent_allocation_produces_contiguous_no_duplicate_sequence() {
    let (_dir, paths, locks) = setup();
    let paths = std::sync::Arc::new(paths);
    let locks = std::sync::Arc::new(locks);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let paths = paths.clone();
            let locks = locks.clone();
            std::thread::spawn(move || {
                allocate_short_id(&paths, &locks, "LAT", &TaskId::new(format!("task_{i}"))).unwrap()
            })
        })
        .collect();

    let mut seqs: Vec<u64> = handles
        .into_iter()
        .map(|h| {
            let short_id = h.join().unwrap();
            short_id.strip_prefix("LAT-").unwrap().parse().unwrap()
        })
        .collect();
    seqs.sort_unstable();

    assert_eq!(seqs, (1..=16).collect::<Vec<u64>>());
}

#[test]
fn separate_prefixes_track_independent_sequences() {
    let (_dir, paths, locks) = setup();
    let a = TaskId::new("task_a");
    let b = TaskId::new("task_b");

    allocate_short_id(&paths, &locks, "LAT", &a).unwrap();
    let first_other = allocate_short_id(&paths, &locks, "OTH", &b).unwrap();
    assert_eq!(first_other, "OTH-1");
}
