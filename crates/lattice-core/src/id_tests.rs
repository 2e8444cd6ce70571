use super::*;

#[test]
fn task_id_round_trips_through_json() {
    let id = TaskId::new("task_01ARZ3NDEKTSV4RRFFQ69G5FAV");
    let json = serde_json::to_string(&id).unwrap();
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn generated_task_id_has_prefix() {
    let gen = UlidIdGen;
    let id = TaskId::generate(&gen);
    assert!(id.as_str().starts_with("task_"));
    assert!(TaskId::has_prefix(id.as_str()));
    assert!(!ArtifactId::has_prefix(id.as_str()));
}

#[test]
fn sequential_id_gen_is_monotonic() {
    let gen = SequentialIdGen::new();
    let a = EventId::generate(&gen);
    let b = EventId::generate(&gen);
    assert_ne!(a, b);
    assert!(a.as_str() < b.as_str());
}

#[test]
fn id_equals_str() {
    let id = TaskId::new("task_abc");
    assert_eq!(id, "task_abc");
    assert_eq!(id.as_str(), "task_abc");
}
