// SPDX-License-Identifier: MIT
//! The on-disk tree layout (spec §3.3): a flat set of path-joining
//! functions over one root `PathBuf`, the way the teacher's
//! `daemon::lifecycle::Config` precomputes every path it needs from a
//! single state directory instead of re-joining strings at each call site.

use lattice_core::{ArtifactId, TaskId};
use std::path::{Path, PathBuf};

/// The directory name holding all of a project's Lattice state.
pub const LATTICE_DIR: &str = ".lattice";

/// Precomputed paths under one project root's `.lattice/` tree.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root (the directory *containing* `.lattice/`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/.lattice`
    pub fn lattice_dir(&self) -> PathBuf {
        self.root.join(LATTICE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.lattice_dir().join("config.json")
    }

    pub fn ids_path(&self) -> PathBuf {
        self.lattice_dir().join("ids.json")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.lattice_dir().join("tasks")
    }

    pub fn task_snapshot_path(&self, task_id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{task_id}.json"))
    }

    pub fn events_dir(&self) -> PathBuf {
        self.lattice_dir().join("events")
    }

    pub fn task_events_path(&self, task_id: &TaskId) -> PathBuf {
        self.events_dir().join(format!("{task_id}.jsonl"))
    }

    pub fn lifecycle_path(&self) -> PathBuf {
        self.events_dir().join("_lifecycle.jsonl")
    }

    pub fn artifacts_meta_dir(&self) -> PathBuf {
        self.lattice_dir().join("artifacts").join("meta")
    }

    pub fn artifact_meta_path(&self, artifact_id: &ArtifactId) -> PathBuf {
        self.artifacts_meta_dir().join(format!("{artifact_id}.json"))
    }

    pub fn artifacts_payload_dir(&self) -> PathBuf {
        self.lattice_dir().join("artifacts").join("payload")
    }

    pub fn artifact_payload_path(&self, artifact_id: &ArtifactId, ext: &str) -> PathBuf {
        self.artifacts_payload_dir()
            .join(format!("{artifact_id}.{ext}"))
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.lattice_dir().join("notes")
    }

    pub fn task_notes_path(&self, task_id: &TaskId) -> PathBuf {
        self.notes_dir().join(format!("{task_id}.md"))
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.lattice_dir().join("archive")
    }

    pub fn archive_tasks_dir(&self) -> PathBuf {
        self.archive_dir().join("tasks")
    }

    pub fn archive_task_snapshot_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_tasks_dir().join(format!("{task_id}.json"))
    }

    pub fn archive_events_dir(&self) -> PathBuf {
        self.archive_dir().join("events")
    }

    pub fn archive_task_events_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_events_dir().join(format!("{task_id}.jsonl"))
    }

    pub fn archive_notes_dir(&self) -> PathBuf {
        self.archive_dir().join("notes")
    }

    pub fn archive_task_notes_path(&self, task_id: &TaskId) -> PathBuf {
        self.archive_notes_dir().join(format!("{task_id}.md"))
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.lattice_dir().join("locks")
    }

    pub fn lock_path(&self, name: &str) -> PathBuf {
        self.locks_dir().join(format!("{name}.lock"))
    }

    /// Every directory [`crate::init::init`] must create.
    pub fn all_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.lattice_dir(),
            self.tasks_dir(),
            self.events_dir(),
            self.artifacts_meta_dir(),
            self.artifacts_payload_dir(),
            self.notes_dir(),
            self.archive_tasks_dir(),
            self.archive_events_dir(),
            self.archive_notes_dir(),
            self.locks_dir(),
        ]
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
