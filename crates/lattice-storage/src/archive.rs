// SPDX-License-Identifier: MIT
//! Archive / unarchive (spec §4.6): append the lifecycle event through the
//! write pipeline first, then move the snapshot, per-task event log, and
//! notes file between the active and archive trees. Artifacts never move.
//! Because the event lands before the move, an interruption mid-move is
//! recoverable by `rebuild` (spec §9's "archive consistency" question —
//! resolved by always writing the event first).

use crate::fsio::atomic_write;
use crate::lock::LockManager;
use crate::paths::Paths;
use crate::write_pipeline::write_task_event;
use lattice_core::error::Result;
use lattice_core::event::BuiltinEventKind;
use lattice_core::{Actor, Context, EventSpec, TaskId, TaskSnapshot};
use std::fs;
use std::path::Path;

fn move_if_present(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Ok(());
    }
    let bytes = fs::read(from)?;
    atomic_write(to, &bytes)?;
    fs::remove_file(from)?;
    Ok(())
}

/// Move `task_id`'s snapshot, event log, and notes file from `tasks/`,
/// `events/`, `notes/` into their `archive/` mirrors (or back, with
/// `reverse: true`).
fn relocate(paths: &Paths, task_id: &TaskId, reverse: bool) -> Result<()> {
    let (snap_from, snap_to) = if reverse {
        (
            paths.archive_task_snapshot_path(task_id),
            paths.task_snapshot_path(task_id),
        )
    } else {
        (
            paths.task_snapshot_path(task_id),
            paths.archive_task_snapshot_path(task_id),
        )
    };
    let (events_from, events_to) = if reverse {
        (
            paths.archive_task_events_path(task_id),
            paths.task_events_path(task_id),
        )
    } else {
        (
            paths.task_events_path(task_id),
            paths.archive_task_events_path(task_id),
        )
    };
    let (notes_from, notes_to) = if reverse {
        (
            paths.archive_task_notes_path(task_id),
            paths.task_notes_path(task_id),
        )
    } else {
        (
            paths.task_notes_path(task_id),
            paths.archive_task_notes_path(task_id),
        )
    };

    move_if_present(&snap_from, &snap_to)?;
    move_if_present(&events_from, &events_to)?;
    move_if_present(&notes_from, &notes_to)?;
    Ok(())
}

/// Archive `task_id`: append `task_archived`, rewrite the snapshot, then
/// move it (and its log and notes) under `archive/`.
pub fn archive(
    ctx: &Context,
    paths: &Paths,
    locks: &LockManager,
    task_id: &TaskId,
    actor: Actor,
) -> Result<TaskSnapshot> {
    let snapshot = write_task_event(
        ctx,
        paths,
        locks,
        task_id,
        vec![EventSpec::builtin(BuiltinEventKind::TaskArchived {}, actor)],
    )?;

    let _guard = locks.acquire(&[
        format!("events_{task_id}").as_str(),
        format!("tasks_{task_id}").as_str(),
    ])?;
    relocate(paths, task_id, false)?;

    Ok(snapshot)
}

/// Unarchive `task_id`: the inverse of [`archive`]. The write pipeline
/// locates an archived task's snapshot and log under `archive/` on its
/// own, so `task_unarchived` is appended (and the snapshot rewritten)
/// there first, exactly mirroring `archive`'s event-then-move order.
pub fn unarchive(
    ctx: &Context,
    paths: &Paths,
    locks: &LockManager,
    task_id: &TaskId,
    actor: Actor,
) -> Result<TaskSnapshot> {
    let snapshot = write_task_event(
        ctx,
        paths,
        locks,
        task_id,
        vec![EventSpec::builtin(BuiltinEventKind::TaskUnarchived {}, actor)],
    )?;

    let _guard = locks.acquire(&[
        format!("events_{task_id}").as_str(),
        format!("tasks_{task_id}").as_str(),
    ])?;
    relocate(paths, task_id, true)?;

    Ok(snapshot)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
