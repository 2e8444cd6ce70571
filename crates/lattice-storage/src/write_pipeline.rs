// SPDX-License-Identifier: MIT
//! The write pipeline (spec §4.4): the single authoritative mutation
//! primitive. Acquire the lock set, re-validate preconditions, apply
//! events to the working snapshot, append to the per-task (and, if
//! applicable, lifecycle) log, atomically rewrite the snapshot, release
//! locks, then fire hooks outside the lock.

use crate::fsio::{append_jsonl_line, atomic_write, read_json, to_compact_line, to_pretty_bytes};
use crate::hooks::{dispatch_event_hooks, dispatch_transition_hook};
use crate::lock::LockManager;
use crate::paths::Paths;
use lattice_core::error::{LatticeError, Result};
use lattice_core::event::BuiltinEventKind;
use lattice_core::{apply, build_event, Context, Event, EventPayload, EventSpec, TaskId, TaskSnapshot};

fn task_exists(paths: &Paths, task_id: &TaskId) -> bool {
    paths.task_snapshot_path(task_id).is_file() || paths.archive_task_snapshot_path(task_id).is_file()
}

/// Where `task_id`'s snapshot and event log currently live. A task lives in
/// exactly one tree at a time — `archive`/`unarchive` move both files
/// together — so an archived snapshot means an archived log too. New tasks
/// (neither file exists yet) are created in the active tree.
fn locate_task_files(paths: &Paths, task_id: &TaskId) -> (std::path::PathBuf, std::path::PathBuf) {
    if paths.archive_task_snapshot_path(task_id).is_file() {
        (
            paths.archive_task_snapshot_path(task_id),
            paths.archive_task_events_path(task_id),
        )
    } else {
        (
            paths.task_snapshot_path(task_id),
            paths.task_events_path(task_id),
        )
    }
}

/// Re-validate preconditions that can only be checked once we hold the
/// lock and have re-read the latest snapshot (spec §4.4 step 2b).
fn validate_precondition(paths: &Paths, event: &Event) -> Result<()> {
    if let Ok(EventPayload::Builtin(BuiltinEventKind::RelationshipAdded { target, .. })) =
        event.payload()
    {
        if !task_exists(paths, &target) {
            return Err(LatticeError::NotFound(format!(
                "relationship target '{target}' does not exist"
            )));
        }
    }
    Ok(())
}

/// Append a sequence of events to `task_id`'s log, atomically rewriting
/// its snapshot, and fire post-event/transition hooks after the lock is
/// released. This is the one write path every mutation in the system goes
/// through (spec §4.4).
pub fn write_task_event(
    ctx: &Context,
    paths: &Paths,
    locks: &LockManager,
    task_id: &TaskId,
    specs: Vec<EventSpec>,
) -> Result<TaskSnapshot> {
    // Step 1: compute the lock set. `events__lifecycle` only joins if at
    // least one of the requested events is in the lifecycle subset — we
    // don't know the final event_type strings until we build each event,
    // but type names are determined solely by the spec's payload, so we
    // can check before building.
    let has_lifecycle_event = specs.iter().any(|s| s.payload.is_lifecycle());
    let events_lock = format!("events_{task_id}");
    let tasks_lock = format!("tasks_{task_id}");
    let mut names: Vec<&str> = vec![events_lock.as_str(), tasks_lock.as_str()];
    if has_lifecycle_event {
        names.push("events__lifecycle");
    }
    let _guard = locks.acquire(&names)?;

    // Step 2a: read latest snapshot under the lock. A task currently
    // archived is read from (and rewritten to) the archive tree, so
    // `archive`/`unarchive` can append their lifecycle event before the
    // file move that follows (spec §4.6 crash-recoverability).
    let (snapshot_path, events_path) = locate_task_files(paths, task_id);
    let existing: Option<TaskSnapshot> = read_json(&snapshot_path)?;

    let mut current = existing.clone();
    let mut events_to_log: Vec<Event> = Vec::new();

    for spec in specs {
        let spec = spec.with_task_id(task_id.clone());
        let event = build_event(spec, ctx.clock().now(), ctx.id_gen())?;
        validate_precondition(paths, &event)?;
        let next = apply(current.as_ref(), &event, &ctx.config().workflow)?;
        let changed = current.as_ref() != Some(&next);
        if changed {
            events_to_log.push(event);
            current = Some(next);
        }
    }

    let Some(final_snapshot) = current else {
        return Err(LatticeError::Integrity(
            "write_task_event produced no snapshot".into(),
        ));
    };

    if events_to_log.is_empty() {
        // Every event was an idempotent no-op (spec §4.4 idempotency
        // envelope): success, but no writes at all.
        return Ok(final_snapshot);
    }

    // Step 2d: append events to the per-task log.
    for event in &events_to_log {
        append_jsonl_line(&events_path, &to_compact_line(event)?)?;
    }

    // Step 2e: append lifecycle-subset events to the shared lifecycle log.
    let lifecycle_path = paths.lifecycle_path();
    for event in events_to_log.iter().filter(|e| e.is_lifecycle()) {
        append_jsonl_line(&lifecycle_path, &to_compact_line(event)?)?;
    }

    // Step 2f: atomically rewrite the snapshot.
    atomic_write(&snapshot_path, &to_pretty_bytes(&final_snapshot)?)?;

    // Step 3: locks release when `_guard` drops at the end of this
    // function's scope — but hooks must fire *after* release, so drop it
    // explicitly before step 4.
    drop(_guard);

    // Step 4: fire hooks outside the lock. Never propagate failures.
    for event in &events_to_log {
        dispatch_event_hooks(ctx.config(), event);
        if matches!(
            event.payload(),
            Ok(EventPayload::Builtin(BuiltinEventKind::StatusChanged { .. }))
        ) {
            dispatch_transition_hook(ctx.config(), event);
        }
    }

    Ok(final_snapshot)
}

#[cfg(test)]
#[path = "write_pipeline_tests.rs"]
mod tests;
