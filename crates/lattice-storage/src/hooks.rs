// SPDX-License-Identifier: MIT
//! Fire-and-forget hook dispatch (spec §4.3's matcher + §4.4 step 4, §9):
//! decide which command applies (pure, in `lattice-core::hooks`), then
//! spawn it detached. The core never waits on a hook subprocess and a
//! hook's failure is logged and dropped, never surfaced to the caller.

use lattice_core::event::BuiltinEventKind;
use lattice_core::{Config, Event, EventPayload};
use std::process::{Command, Stdio};
use tracing::warn;

fn spawn_detached(command: &str, env: &[(&str, String)]) {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }
    match cmd.spawn() {
        Ok(_child) => {}
        Err(e) => warn!(command, error = %e, "failed to spawn hook"),
    }
}

fn event_env(event: &Event) -> Vec<(&'static str, String)> {
    let mut env = vec![
        ("LATTICE_EVENT_ID", event.id.to_string()),
        ("LATTICE_EVENT_TYPE", event.event_type.clone()),
        ("LATTICE_ACTOR", event.actor.to_string()),
    ];
    if let Some(task_id) = &event.task_id {
        env.push(("LATTICE_TASK_ID", task_id.to_string()));
    }
    env
}

/// Fire the global `post_event` hook (if configured) and the per-type
/// `on.<type>` hook (if configured) for one event. Called outside the
/// write lock.
pub fn dispatch_event_hooks(config: &Config, event: &Event) {
    let Some(hooks) = &config.hooks else {
        return;
    };
    let env = event_env(event);

    if let Some(post_event) = &hooks.post_event {
        spawn_detached(post_event, &env);
    }

    if let Some(command) = lattice_core::resolve_event_hook(&hooks.on, &event.event_type) {
        spawn_detached(command, &env);
    }
}

/// Fire the matching transition hook (if any) for a `status_changed`
/// event, per the precedence order in `lattice_core::hooks`.
pub fn dispatch_transition_hook(config: &Config, event: &Event) {
    let Some(hooks) = &config.hooks else {
        return;
    };
    let Ok(EventPayload::Builtin(BuiltinEventKind::StatusChanged { from, to, .. })) =
        event.payload()
    else {
        return;
    };

    let Some(command) = lattice_core::resolve_transition_hook(&hooks.transitions, &from, &to)
    else {
        return;
    };

    let mut env = event_env(event);
    env.push(("FROM_STATUS", from));
    env.push(("TO_STATUS", to));
    spawn_detached(command, &env);
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
