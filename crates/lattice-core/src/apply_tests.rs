use super::*;
use crate::actor::Actor;
use crate::clock::{Clock, FakeClock};
use crate::event::{build_event, EventSpec};
use crate::id::{IdGen, SequentialIdGen, TaskId};

fn actor() -> Actor {
    Actor::parse("human:alice").unwrap()
}

fn make_event(kind: BuiltinEventKind, task_id: &TaskId, clock: &FakeClock, gen: &dyn IdGen) -> Event {
    build_event(
        EventSpec::builtin(kind, actor()).with_task_id(task_id.clone()),
        clock.now(),
        gen,
    )
    .unwrap()
}

fn created(task_id: &TaskId, clock: &FakeClock, gen: &dyn IdGen) -> Event {
    make_event(
        BuiltinEventKind::TaskCreated {
            title: "Fix login".into(),
            description: None,
            status: "backlog".into(),
            priority: None,
            urgency: None,
            task_type: None,
            tags: vec!["auth".into()],
            assigned_to: None,
            custom_fields: Default::default(),
        },
        task_id,
        clock,
        gen,
    )
}

#[test]
fn task_created_initializes_snapshot() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let event = created(&task_id, &clock, &gen);
    let snap = apply(None, &event, &workflow).unwrap();

    assert_eq!(snap.id, task_id);
    assert_eq!(snap.title, "Fix login");
    assert_eq!(snap.status, "backlog");
    assert!(snap.tags.contains("auth"));
    assert_eq!(snap.last_event_id, event.id);
    assert!(!snap.archived);
}

#[test]
fn task_created_missing_task_id_is_rejected() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let workflow = WorkflowConfig::default();

    let event = build_event(
        EventSpec::builtin(
            BuiltinEventKind::TaskCreated {
                title: "x".into(),
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
        ),
        clock.now(),
        &gen,
    )
    .unwrap();

    let err = apply(None, &event, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::Integrity(_)));
}

#[test]
fn event_before_creation_is_rejected() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let event = make_event(
        BuiltinEventKind::CommentAdded { body: "hi".into() },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(None, &event, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::Integrity(_)));
}

#[test]
fn duplicate_creation_with_same_payload_is_idempotent() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let first = created(&task_id, &clock, &gen);
    let snap = apply(None, &first, &workflow).unwrap();

    let second = created(&task_id, &clock, &gen);
    let snap2 = apply(Some(&snap), &second, &workflow).unwrap();
    assert_eq!(snap, snap2);
}

#[test]
fn duplicate_creation_with_different_payload_conflicts() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let first = created(&task_id, &clock, &gen);
    let snap = apply(None, &first, &workflow).unwrap();

    let second = make_event(
        BuiltinEventKind::TaskCreated {
            title: "Different title".into(),
            description: None,
            status: "backlog".into(),
            priority: None,
            urgency: None,
            task_type: None,
            tags: vec!["auth".into()],
            assigned_to: None,
            custom_fields: Default::default(),
        },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(Some(&snap), &second, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::Conflict(_)));
}

#[test]
fn status_changed_updates_status_when_transition_allowed() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::StatusChanged {
            from: "backlog".into(),
            to: "ready".into(),
            forced: false,
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &event, &workflow).unwrap();
    assert_eq!(snap2.status, "ready");
}

#[test]
fn status_changed_rejects_disallowed_transition() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::StatusChanged {
            from: "backlog".into(),
            to: "done".into(),
            forced: false,
        },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(Some(&snap), &event, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::InvalidTransition { .. }));
}

#[test]
fn forced_status_change_bypasses_workflow_table() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::StatusChanged {
            from: "backlog".into(),
            to: "done".into(),
            forced: true,
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &event, &workflow).unwrap();
    assert_eq!(snap2.status, "done");
}

#[test]
fn status_changed_rejects_mismatched_from() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::StatusChanged {
            from: "ready".into(),
            to: "in_progress".into(),
            forced: false,
        },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(Some(&snap), &event, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::Integrity(_)));
}

#[test]
fn field_updated_rejects_protected_field() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::FieldUpdated {
            field: "created_at".into(),
            to: serde_json::json!("2020-01-01T00:00:00Z"),
        },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(Some(&snap), &event, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::ProtectedField(_)));
}

#[test]
fn field_updated_writes_known_field() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::FieldUpdated {
            field: "priority".into(),
            to: serde_json::json!("high"),
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &event, &workflow).unwrap();
    assert_eq!(snap2.priority.as_deref(), Some("high"));
}

#[test]
fn field_updated_writes_unknown_field_into_custom_fields() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let event = make_event(
        BuiltinEventKind::FieldUpdated {
            field: "points".into(),
            to: serde_json::json!(5),
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &event, &workflow).unwrap();
    assert_eq!(snap2.custom_fields.get("points"), Some(&serde_json::json!(5)));
}

#[test]
fn relationship_added_then_removed_round_trips() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let other = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let add = make_event(
        BuiltinEventKind::RelationshipAdded {
            rel_type: "blocks".into(),
            target: other.clone(),
            note: None,
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &add, &workflow).unwrap();
    assert!(snap2.has_relationship("blocks", &other));

    let remove = make_event(
        BuiltinEventKind::RelationshipRemoved {
            rel_type: "blocks".into(),
            target: other.clone(),
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap3 = apply(Some(&snap2), &remove, &workflow).unwrap();
    assert!(!snap3.has_relationship("blocks", &other));
}

#[test]
fn duplicate_relationship_added_is_not_duplicated() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let other = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let mut snap = apply(None, &created_event, &workflow).unwrap();

    for _ in 0..2 {
        let add = make_event(
            BuiltinEventKind::RelationshipAdded {
                rel_type: "blocks".into(),
                target: other.clone(),
                note: None,
            },
            &task_id,
            &clock,
            &gen,
        );
        snap = apply(Some(&snap), &add, &workflow).unwrap();
    }
    assert_eq!(snap.relationships_out.len(), 1);
}

#[test]
fn relationship_added_rejects_self_link() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let add = make_event(
        BuiltinEventKind::RelationshipAdded {
            rel_type: "blocks".into(),
            target: task_id.clone(),
            note: None,
        },
        &task_id,
        &clock,
        &gen,
    );
    let err = apply(Some(&snap), &add, &workflow).unwrap_err();
    assert!(matches!(err, LatticeError::InvalidId(_)));
}

#[test]
fn process_started_then_completed_clears_active_process() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let start = make_event(
        BuiltinEventKind::ProcessStarted {
            label: Some("worker".into()),
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &start, &workflow).unwrap();
    assert_eq!(snap2.active_processes.len(), 1);

    let complete = make_event(
        BuiltinEventKind::ProcessCompleted {
            started_event_id: start.id.clone(),
        },
        &task_id,
        &clock,
        &gen,
    );
    let snap3 = apply(Some(&snap2), &complete, &workflow).unwrap();
    assert!(snap3.active_processes.is_empty());
}

#[test]
fn archived_and_unarchived_toggle_flag() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let archived = make_event(BuiltinEventKind::TaskArchived {}, &task_id, &clock, &gen);
    let snap2 = apply(Some(&snap), &archived, &workflow).unwrap();
    assert!(snap2.archived);

    let unarchived = make_event(BuiltinEventKind::TaskUnarchived {}, &task_id, &clock, &gen);
    let snap3 = apply(Some(&snap2), &unarchived, &workflow).unwrap();
    assert!(!snap3.archived);
}

#[test]
fn comment_added_does_not_mutate_fields_but_bumps_last_event_id() {
    let clock = FakeClock::default();
    let gen = SequentialIdGen::new();
    let task_id = TaskId::generate(&gen);
    let workflow = WorkflowConfig::default();

    let created_event = created(&task_id, &clock, &gen);
    let snap = apply(None, &created_event, &workflow).unwrap();

    let comment = make_event(
        BuiltinEventKind::CommentAdded { body: "looks good".into() },
        &task_id,
        &clock,
        &gen,
    );
    let snap2 = apply(Some(&snap), &comment, &workflow).unwrap();
    assert_eq!(snap2.title, snap.title);
    assert_eq!(snap2.last_event_id, comment.id);
}
