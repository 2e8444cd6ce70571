// SPDX-License-Identifier: MIT
//! The task snapshot (spec §3.1): a materialized view derived from a task's
//! event log. The log is authoritative; the snapshot exists purely so reads
//! don't have to replay it.

use crate::id::{ArtifactId, EventId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

fn default_schema_version() -> u32 {
    1
}

/// One out-edge in the task's relationship graph (spec §3.1). Core stores
/// only out-edges — reverse lookups are scans, per spec §9.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub target_task_id: TaskId,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A worker process tracked against `active_processes`, keyed by the
/// `process_started` event that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProcess {
    pub started_event_id: EventId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The status a task is in. Validity against the configured status set is
/// checked by the caller ([`crate::apply`]), not by this type, since the
/// set of valid statuses is project-configured (spec §3.1/§4.3).
pub type Status = String;

/// A materialized snapshot of one task (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub task_type: Option<String>,
    /// `BTreeSet`, not `HashSet`: rebuild must produce byte-identical JSON
    /// (spec §8 property 1), which rules out hash-ordered iteration.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub relationships_out: Vec<Relationship>,
    #[serde(default)]
    pub artifact_refs: Vec<ArtifactId>,
    #[serde(default)]
    pub active_processes: Vec<ActiveProcess>,
    pub last_event_id: EventId,
    #[serde(default)]
    pub archived: bool,
    /// `BTreeMap`, not `HashMap`, for the same determinism reason as `tags`.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

impl TaskSnapshot {
    /// True if `(rel_type, target)` is already present among the out-edges.
    pub fn has_relationship(&self, rel_type: &str, target: &TaskId) -> bool {
        self.relationships_out
            .iter()
            .any(|r| r.rel_type == rel_type && &r.target_task_id == target)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
