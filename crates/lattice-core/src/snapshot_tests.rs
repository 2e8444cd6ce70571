use super::*;

fn sample() -> TaskSnapshot {
    let now = chrono::Utc::now();
    TaskSnapshot {
        schema_version: 1,
        id: TaskId::new("task_a"),
        short_id: Some("LAT-1".into()),
        title: "Fix login".into(),
        description: None,
        status: "backlog".into(),
        priority: None,
        urgency: None,
        task_type: None,
        tags: BTreeSet::new(),
        assigned_to: None,
        created_by: "human:alice".into(),
        created_at: now,
        updated_at: now,
        relationships_out: Vec::new(),
        artifact_refs: Vec::new(),
        active_processes: Vec::new(),
        last_event_id: EventId::new("ev_1"),
        archived: false,
        custom_fields: BTreeMap::new(),
    }
}

#[test]
fn has_relationship_checks_type_and_target() {
    let mut snap = sample();
    snap.relationships_out.push(Relationship {
        rel_type: "blocks".into(),
        target_task_id: TaskId::new("task_b"),
        created_at: chrono::Utc::now(),
        created_by: "human:alice".into(),
        note: None,
    });
    assert!(snap.has_relationship("blocks", &TaskId::new("task_b")));
    assert!(!snap.has_relationship("blocks", &TaskId::new("task_c")));
    assert!(!snap.has_relationship("depends_on", &TaskId::new("task_b")));
}

#[test]
fn round_trips_through_json_byte_identical() {
    let mut snap = sample();
    snap.tags.insert("backend".into());
    snap.tags.insert("auth".into());
    snap.custom_fields
        .insert("points".into(), serde_json::json!(3));

    let bytes = serde_json::to_vec_pretty(&snap).unwrap();
    let parsed: TaskSnapshot = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(snap, parsed);

    let bytes2 = serde_json::to_vec_pretty(&parsed).unwrap();
    assert_eq!(bytes, bytes2);
}

#[test]
fn tags_serialize_in_sorted_order() {
    let mut snap = sample();
    snap.tags.insert("zeta".into());
    snap.tags.insert("alpha".into());
    let value = serde_json::to_value(&snap).unwrap();
    let tags: Vec<&str> = value["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["alpha", "zeta"]);
}
