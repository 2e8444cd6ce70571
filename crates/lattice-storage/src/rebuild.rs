// SPDX-License-Identifier: MIT
//! Deterministic replay (spec §4.6): regenerate a task's snapshot — and,
//! always, the two global derived indexes (`_lifecycle.jsonl`, `ids.json`)
//! — directly from the per-task event logs. Same input logs must yield
//! byte-identical outputs (spec §8 property 1), which is why every
//! collection here goes through a `BTreeMap`/sorted `Vec` before being
//! written out.

use crate::eventlog::scan_log;
use crate::fsio::{atomic_write, to_pretty_bytes};
use crate::lock::LockManager;
use crate::paths::Paths;
use crate::shortid::ShortIdIndex;
use lattice_core::error::{LatticeError, Result};
use lattice_core::{apply, Event, TaskId, TaskSnapshot, WorkflowConfig};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// What to rebuild: a single task or every task on disk.
pub enum Selection {
    Task(TaskId),
    All,
}

#[derive(Debug, Default)]
pub struct RebuildReport {
    pub tasks_rebuilt: Vec<TaskId>,
    pub lifecycle_events_written: usize,
    pub short_ids_indexed: usize,
}

/// Task IDs with a per-task log under `dir`, derived from file names
/// (`<task_id>.jsonl`), skipping the lifecycle log itself.
pub(crate) fn list_logged_tasks(dir: &Path) -> Result<Vec<TaskId>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name.strip_suffix(".jsonl") else {
            continue;
        };
        if stem == "_lifecycle" {
            continue;
        }
        ids.push(TaskId::new(stem));
    }
    Ok(ids)
}

/// Fold one task's full event log into a fresh snapshot and atomically
/// overwrite it (spec §4.6 rebuild steps 1-3). Returns `None` if the task
/// has no recognizable log (nothing to rebuild).
fn rebuild_one(
    events_path: &Path,
    snapshot_path: &Path,
    workflow: &WorkflowConfig,
) -> Result<Option<TaskSnapshot>> {
    let Some(scanned) = scan_log(events_path)? else {
        return Ok(None);
    };

    let mut current: Option<TaskSnapshot> = None;
    for event in &scanned.events {
        current = Some(apply(current.as_ref(), event, workflow)?);
    }

    let Some(snapshot) = current else {
        return Ok(None);
    };

    atomic_write(snapshot_path, &to_pretty_bytes(&snapshot)?)?;
    Ok(Some(snapshot))
}

/// Collect every lifecycle-subset event across every per-task log (active
/// and archived), in timestamp-then-ID order, and atomically overwrite
/// `_lifecycle.jsonl` with them.
pub(crate) fn regenerate_lifecycle(paths: &Paths) -> Result<usize> {
    let mut events: Vec<Event> = Vec::new();

    for dir in [paths.events_dir(), paths.archive_events_dir()] {
        for task_id in list_logged_tasks(&dir)? {
            let log_path = dir.join(format!("{task_id}.jsonl"));
            if let Some(scanned) = scan_log(&log_path)? {
                events.extend(scanned.events.into_iter().filter(|e| e.is_lifecycle()));
            }
        }
    }

    events.sort_by(|a, b| a.ts.cmp(&b.ts).then_with(|| a.id.cmp(&b.id)));

    let mut body = Vec::new();
    for event in &events {
        body.extend(crate::fsio::to_compact_line(event)?);
        body.push(b'\n');
    }
    atomic_write(&paths.lifecycle_path(), &body)?;
    Ok(events.len())
}

/// Scan every snapshot (active and archived) for `short_id` and rebuild
/// the short-ID index: the map, plus `next_seqs` as the max observed
/// sequence per prefix, plus one (spec §4.5).
pub(crate) fn regenerate_short_ids(paths: &Paths) -> Result<usize> {
    let mut map: BTreeMap<String, TaskId> = BTreeMap::new();
    let mut next_seqs: BTreeMap<String, u64> = BTreeMap::new();

    for dir in [paths.tasks_dir(), paths.archive_tasks_dir()] {
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read_to_string(&path)?;
            let snapshot: TaskSnapshot = serde_json::from_str(&raw)?;
            let Some(short_id) = &snapshot.short_id else {
                continue;
            };
            let Some((prefix, seq_str)) = short_id.rsplit_once('-') else {
                continue;
            };
            let Ok(seq) = seq_str.parse::<u64>() else {
                continue;
            };
            map.insert(short_id.clone(), snapshot.id.clone());
            let entry = next_seqs.entry(prefix.to_string()).or_insert(0);
            *entry = (*entry).max(seq + 1);
        }
    }

    let index = ShortIdIndex::from_parts(next_seqs, map);
    let count = index.len();
    atomic_write(&paths.ids_path(), &to_pretty_bytes(&index)?)?;
    Ok(count)
}

/// Rebuild `selection`, then unconditionally regenerate the two global
/// derived indexes from whatever per-task logs are now on disk (spec
/// §4.6: rebuild always leaves the whole tree internally consistent, not
/// just the task named in `selection`).
pub fn rebuild(
    paths: &Paths,
    locks: &LockManager,
    workflow: &WorkflowConfig,
    selection: Selection,
) -> Result<RebuildReport> {
    let mut report = RebuildReport::default();

    let targets: Vec<TaskId> = match selection {
        Selection::Task(id) => vec![id],
        Selection::All => {
            let mut ids = list_logged_tasks(&paths.events_dir())?;
            ids.extend(list_logged_tasks(&paths.archive_events_dir())?);
            ids.sort();
            ids.dedup();
            ids
        }
    };

    for task_id in targets {
        let _guard = locks.acquire(&[
            format!("events_{task_id}").as_str(),
            format!("tasks_{task_id}").as_str(),
        ])?;

        let active_log = paths.task_events_path(&task_id);
        let rebuilt = if active_log.is_file() {
            rebuild_one(&active_log, &paths.task_snapshot_path(&task_id), workflow)?
        } else {
            let archive_log = paths.archive_task_events_path(&task_id);
            rebuild_one(
                &archive_log,
                &paths.archive_task_snapshot_path(&task_id),
                workflow,
            )?
        };

        match rebuilt {
            Some(_) => report.tasks_rebuilt.push(task_id),
            None => {
                return Err(LatticeError::NotFound(format!(
                    "no event log found for task '{task_id}'"
                )))
            }
        }
    }

    let _lifecycle_guard = locks.acquire(&["events__lifecycle"])?;
    report.lifecycle_events_written = regenerate_lifecycle(paths)?;
    drop(_lifecycle_guard);

    let _ids_guard = locks.acquire(&["ids_json"])?;
    report.short_ids_indexed = regenerate_short_ids(paths)?;

    Ok(report)
}

#[cfg(test)]
#[path = "rebuild_tests.rs"]
mod tests;
