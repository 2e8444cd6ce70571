use super::*;
use lattice_core::{Actor, EventSpec, HooksConfig, SequentialIdGen, TaskId};
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn wait_for(path: &std::path::Path) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if path.is_file() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

fn actor() -> Actor {
    Actor::parse("human:alice").unwrap()
}

#[test]
fn post_event_hook_fires_for_any_event() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("post.marker");
    let mut config = Config::default();
    config.hooks = Some(HooksConfig {
        post_event: Some(format!("touch {}", marker.display())),
        on: Default::default(),
        transitions: Default::default(),
    });

    let gen = SequentialIdGen::new();
    let event = lattice_core::build_event(
        EventSpec::custom("x_noop", serde_json::json!({}), actor())
            .with_task_id(TaskId::generate(&gen)),
        chrono::Utc::now(),
        &gen,
    )
    .unwrap();

    dispatch_event_hooks(&config, &event);
    assert!(wait_for(&marker));
}

#[test]
fn on_type_hook_fires_only_for_matching_type() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("on.marker");
    let mut on = std::collections::BTreeMap::new();
    on.insert("comment_added".to_string(), format!("touch {}", marker.display()));
    let mut config = Config::default();
    config.hooks = Some(HooksConfig {
        post_event: None,
        on,
        transitions: Default::default(),
    });

    let gen = SequentialIdGen::new();
    let event = lattice_core::build_event(
        EventSpec::builtin(
            lattice_core::event::BuiltinEventKind::CommentAdded { body: "hi".into() },
            actor(),
        )
        .with_task_id(TaskId::generate(&gen)),
        chrono::Utc::now(),
        &gen,
    )
    .unwrap();

    dispatch_event_hooks(&config, &event);
    assert!(wait_for(&marker));
}

#[test]
fn transition_hook_receives_from_and_to_env() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("transition.marker");
    let mut transitions = std::collections::BTreeMap::new();
    transitions.insert(
        "backlog -> ready".to_string(),
        format!(
            "echo \"$FROM_STATUS->$TO_STATUS\" > {}",
            marker.display()
        ),
    );
    let mut config = Config::default();
    config.hooks = Some(HooksConfig {
        post_event: None,
        on: Default::default(),
        transitions,
    });

    let gen = SequentialIdGen::new();
    let event = lattice_core::build_event(
        EventSpec::builtin(
            lattice_core::event::BuiltinEventKind::StatusChanged {
                from: "backlog".into(),
                to: "ready".into(),
                forced: false,
            },
            actor(),
        )
        .with_task_id(TaskId::generate(&gen)),
        chrono::Utc::now(),
        &gen,
    )
    .unwrap();

    dispatch_transition_hook(&config, &event);
    assert!(wait_for(&marker));
    assert_eq!(std::fs::read_to_string(&marker).unwrap().trim(), "backlog->ready");
}

#[test]
fn no_hooks_configured_is_a_silent_no_op() {
    let config = Config::default();
    let gen = SequentialIdGen::new();
    let event = lattice_core::build_event(
        EventSpec::custom("x_noop", serde_json::json!({}), actor())
            .with_task_id(TaskId::generate(&gen)),
        chrono::Utc::now(),
        &gen,
    )
    .unwrap();
    dispatch_event_hooks(&config, &event);
    dispatch_transition_hook(&config, &event);
}
