// SPDX-License-Identifier: MIT
//! The short-ID allocator and its derived index (spec §4.5): `ids.json`
//! maps human-friendly `PREFIX-N` aliases onto opaque task IDs, and is
//! fully rebuildable from snapshots.

use crate::fsio::{atomic_write, read_json, to_pretty_bytes};
use crate::lock::LockManager;
use crate::paths::Paths;
use lattice_core::error::Result;
use lattice_core::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_schema_version() -> u32 {
    1
}

/// The derived short-ID index (spec §3.1, §4.5): rebuildable from
/// snapshots, never authoritative on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortIdIndex {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub next_seqs: BTreeMap<String, u64>,
    #[serde(default)]
    pub map: BTreeMap<String, TaskId>,
}

impl ShortIdIndex {
    pub fn empty() -> Self {
        Self {
            schema_version: default_schema_version(),
            next_seqs: BTreeMap::new(),
            map: BTreeMap::new(),
        }
    }

    pub fn load(paths: &Paths) -> Result<Self> {
        Ok(read_json(&paths.ids_path())?.unwrap_or_else(Self::empty))
    }

    /// Build an index directly from already-computed parts, the shape
    /// [`crate::rebuild::rebuild`] regenerates from snapshots.
    pub fn from_parts(next_seqs: BTreeMap<String, u64>, map: BTreeMap<String, TaskId>) -> Self {
        Self {
            schema_version: default_schema_version(),
            next_seqs,
            map,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn save(&self, paths: &Paths) -> Result<()> {
        atomic_write(&paths.ids_path(), &to_pretty_bytes(self)?)
    }

    /// Allocate the next `<prefix>-<seq>` alias for `task_id` and persist
    /// the updated index. Caller must already hold the `ids_json` lock.
    fn allocate(&mut self, prefix: &str, task_id: &TaskId) -> String {
        let seq = *self.next_seqs.get(prefix).unwrap_or(&1);
        let short_id = format!("{prefix}-{seq}");
        self.next_seqs.insert(prefix.to_string(), seq + 1);
        self.map.insert(short_id.clone(), task_id.clone());
        short_id
    }

    /// Look up a short ID or a bare task ID (detected by prefix).
    pub fn resolve(&self, short_or_long_id: &str) -> Option<TaskId> {
        if TaskId::has_prefix(short_or_long_id) {
            return Some(TaskId::new(short_or_long_id));
        }
        self.map.get(short_or_long_id).cloned()
    }
}

/// Allocate a fresh short ID for `task_id` under `prefix`, locking,
/// reading, bumping, and atomically rewriting `ids.json` (spec §4.5).
pub fn allocate_short_id(
    paths: &Paths,
    locks: &LockManager,
    prefix: &str,
    task_id: &TaskId,
) -> Result<String> {
    let _guard = locks.acquire(&["ids_json"])?;
    let mut index = ShortIdIndex::load(paths)?;
    let short_id = index.allocate(prefix, task_id);
    index.save(paths)?;
    Ok(short_id)
}

/// Resolve a short or long ID to a task ID without locking (read-only,
/// spec §4.5 — readers tolerate the absence of locking).
pub fn resolve(paths: &Paths, short_or_long_id: &str) -> Result<Option<TaskId>> {
    let index = ShortIdIndex::load(paths)?;
    Ok(index.resolve(short_or_long_id))
}

#[cfg(test)]
#[path = "shortid_tests.rs"]
mod tests;
