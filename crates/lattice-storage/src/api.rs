// SPDX-License-Identifier: MIT
//! The public callee-facing surface (spec §6): everything a CLI, dashboard,
//! or MCP adapter calls into. Thin wrappers over the modules that do the
//! actual work — this file exists so callers have one place to look.

use crate::eventlog::scan_log;
use crate::fsio::read_json;
use crate::lock::LockManager;
use crate::paths::Paths;
use lattice_core::error::Result;
use lattice_core::{Config, Event, TaskSnapshot};

/// Load `config.json`, or [`Config::default`] if the project hasn't been
/// initialized with a custom one yet.
pub fn load_config(paths: &Paths) -> Result<Config> {
    Ok(read_json(&paths.config_path())?.unwrap_or_default())
}

/// Load `task_id`'s current snapshot, checking the active tree first and
/// falling back to the archive tree. `Ok(None)` means no such task.
pub fn load_snapshot(paths: &Paths, task_id: &lattice_core::TaskId) -> Result<Option<TaskSnapshot>> {
    if let Some(snap) = read_json(&paths.task_snapshot_path(task_id))? {
        return Ok(Some(snap));
    }
    read_json(&paths.archive_task_snapshot_path(task_id))
}

/// Read `task_id`'s full event log in file order (active tree first, then
/// archive), tolerating an at-most-one truncated trailing line the way
/// `rebuild` does.
pub fn scan_events(paths: &Paths, task_id: &lattice_core::TaskId) -> Result<Vec<Event>> {
    if let Some(scanned) = scan_log(&paths.task_events_path(task_id))? {
        return Ok(scanned.events);
    }
    Ok(scan_log(&paths.archive_task_events_path(task_id))?
        .map(|s| s.events)
        .unwrap_or_default())
}

/// A read-time filter over [`list_active_tasks`]. `None` fields match
/// anything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub tag: Option<String>,
}

impl TaskFilter {
    fn matches(&self, snapshot: &TaskSnapshot) -> bool {
        if let Some(status) = &self.status {
            if &snapshot.status != status {
                return false;
            }
        }
        if let Some(assigned_to) = &self.assigned_to {
            if snapshot.assigned_to.as_deref() != Some(assigned_to.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !snapshot.tags.contains(tag) {
                return false;
            }
        }
        true
    }
}

/// List every snapshot in the active tree, optionally narrowed by
/// `filter`. Archived tasks are never included — that's what "active"
/// means here.
pub fn list_active_tasks(paths: &Paths, filter: Option<&TaskFilter>) -> Result<Vec<TaskSnapshot>> {
    let dir = paths.tasks_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = std::fs::read_to_string(&path)?;
        let snapshot: TaskSnapshot = serde_json::from_str(&raw)?;
        if filter.map(|f| f.matches(&snapshot)).unwrap_or(true) {
            out.push(snapshot);
        }
    }
    out.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(out)
}

pub use crate::archive::{archive, unarchive};
pub use crate::doctor::{doctor, DoctorReport, Finding};
pub use crate::init::{init, InitOutcome};
pub use crate::rebuild::{rebuild, RebuildReport, Selection};
pub use crate::rootdiscovery::find_root;
pub use crate::shortid::{allocate_short_id, resolve};
pub use crate::write_pipeline::write_task_event;

/// Everything a write pipeline call needs bundled for convenience. Not
/// required — callers may also pass `&Paths`/`&LockManager` around
/// directly — but this mirrors how most call sites use them together.
pub struct Storage {
    pub paths: Paths,
    pub locks: LockManager,
}

impl Storage {
    pub fn open(root: impl Into<std::path::PathBuf>) -> Self {
        let paths = Paths::new(root);
        let locks = LockManager::new(paths.locks_dir());
        Self { paths, locks }
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
