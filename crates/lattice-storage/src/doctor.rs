// SPDX-License-Identifier: MIT
//! Structural validation with a narrow, well-defined repair mode (spec
//! §4.6). Read-only by default; `--fix` trims at most one truncated
//! trailing line per log and then regenerates the two derived indexes via
//! the same routines `rebuild` uses.

use crate::eventlog::{scan_log, trim_to_line_count};
use crate::lock::LockManager;
use crate::paths::Paths;
use crate::rebuild::{list_logged_tasks, regenerate_lifecycle, regenerate_short_ids};
use crate::shortid::ShortIdIndex;
use lattice_core::error::Result;
use lattice_core::{TaskId, TaskSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

/// One structural issue found by [`doctor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    CorruptSnapshot { path: String, error: String },
    CorruptLog { path: String, error: String },
    TruncatedTail { path: String },
    Drift { task_id: TaskId, snapshot_last_event_id: String, log_last_event_id: String },
    DanglingRelationshipTarget { task_id: TaskId, target: TaskId },
    DanglingArtifactRef { task_id: TaskId, artifact_id: String },
    DuplicateShortId { short_id: String },
    NextSeqTooLow { prefix: String, next_seq: u64, max_observed: u64 },
    LifecycleMismatch { missing_event_ids: Vec<String> },
}

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub findings: Vec<Finding>,
    pub truncated_tails_fixed: usize,
    pub indexes_regenerated: bool,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

struct LoadedSnapshot {
    task_id: TaskId,
    snapshot: TaskSnapshot,
}

fn load_snapshots(dir: &std::path::Path, findings: &mut Vec<Finding>) -> Result<Vec<LoadedSnapshot>> {
    let mut out = Vec::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<TaskSnapshot>(&raw) {
            Ok(snapshot) => out.push(LoadedSnapshot {
                task_id: snapshot.id.clone(),
                snapshot,
            }),
            Err(e) => findings.push(Finding::CorruptSnapshot {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }
    Ok(out)
}

/// Run every check in spec §4.6's list. With `fix: true`, truncated
/// trailing lines are trimmed and both derived indexes are regenerated
/// afterward; every other finding is reported only.
pub fn doctor(paths: &Paths, locks: &LockManager, fix: bool) -> Result<DoctorReport> {
    let mut findings = Vec::new();

    let active_snapshots = load_snapshots(&paths.tasks_dir(), &mut findings)?;
    let archive_snapshots = load_snapshots(&paths.archive_tasks_dir(), &mut findings)?;

    let mut known_task_ids: BTreeSet<TaskId> = BTreeSet::new();
    for s in active_snapshots.iter().chain(archive_snapshots.iter()) {
        known_task_ids.insert(s.task_id.clone());
    }

    let mut truncated_tails_fixed = 0usize;

    for (dir, is_archive) in [
        (paths.events_dir(), false),
        (paths.archive_events_dir(), true),
    ] {
        for task_id in list_logged_tasks(&dir)? {
            let log_path = dir.join(format!("{task_id}.jsonl"));
            let scanned = match scan_log(&log_path) {
                Ok(Some(scanned)) => scanned,
                Ok(None) => continue,
                Err(e) => {
                    findings.push(Finding::CorruptLog {
                        path: log_path.display().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if scanned.truncated_tail {
                findings.push(Finding::TruncatedTail {
                    path: log_path.display().to_string(),
                });
                if fix {
                    let lock_name = format!("events_{task_id}");
                    let _guard = locks.acquire(&[lock_name.as_str()])?;
                    trim_to_line_count(&log_path, scanned.events.len())?;
                    truncated_tails_fixed += 1;
                }
            }

            let Some(last_event) = scanned.events.last() else {
                continue;
            };
            let snapshot = if is_archive {
                archive_snapshots.iter().find(|s| s.task_id == task_id)
            } else {
                active_snapshots.iter().find(|s| s.task_id == task_id)
            };
            if let Some(loaded) = snapshot {
                if loaded.snapshot.last_event_id != last_event.id {
                    findings.push(Finding::Drift {
                        task_id: task_id.clone(),
                        snapshot_last_event_id: loaded.snapshot.last_event_id.to_string(),
                        log_last_event_id: last_event.id.to_string(),
                    });
                }
            }
        }
    }

    for loaded in active_snapshots.iter().chain(archive_snapshots.iter()) {
        for rel in &loaded.snapshot.relationships_out {
            if !known_task_ids.contains(&rel.target_task_id) {
                findings.push(Finding::DanglingRelationshipTarget {
                    task_id: loaded.task_id.clone(),
                    target: rel.target_task_id.clone(),
                });
            }
        }
        for artifact_id in &loaded.snapshot.artifact_refs {
            if !paths.artifact_meta_path(artifact_id).is_file() {
                findings.push(Finding::DanglingArtifactRef {
                    task_id: loaded.task_id.clone(),
                    artifact_id: artifact_id.to_string(),
                });
            }
        }
    }

    let mut seen_short_ids: BTreeSet<String> = BTreeSet::new();
    let mut max_observed: BTreeMap<String, u64> = BTreeMap::new();
    for loaded in active_snapshots.iter().chain(archive_snapshots.iter()) {
        let Some(short_id) = &loaded.snapshot.short_id else {
            continue;
        };
        if !seen_short_ids.insert(short_id.clone()) {
            findings.push(Finding::DuplicateShortId {
                short_id: short_id.clone(),
            });
        }
        if let Some((prefix, seq_str)) = short_id.rsplit_once('-') {
            if let Ok(seq) = seq_str.parse::<u64>() {
                let entry = max_observed.entry(prefix.to_string()).or_insert(0);
                *entry = (*entry).max(seq);
            }
        }
    }
    let index = ShortIdIndex::load(paths)?;
    for (prefix, max_seq) in &max_observed {
        let next_seq = index.next_seqs.get(prefix).copied().unwrap_or(0);
        if next_seq <= *max_seq {
            findings.push(Finding::NextSeqTooLow {
                prefix: prefix.clone(),
                next_seq,
                max_observed: *max_seq,
            });
        }
    }

    let lifecycle_scanned = scan_log(&paths.lifecycle_path())?;
    let lifecycle_ids: BTreeSet<String> = lifecycle_scanned
        .map(|s| s.events.into_iter().map(|e| e.id.to_string()).collect())
        .unwrap_or_default();
    let mut expected_lifecycle_ids: Vec<String> = Vec::new();
    for (dir, _) in [
        (paths.events_dir(), false),
        (paths.archive_events_dir(), true),
    ] {
        for task_id in list_logged_tasks(&dir)? {
            let log_path = dir.join(format!("{task_id}.jsonl"));
            if let Some(scanned) = scan_log(&log_path)? {
                expected_lifecycle_ids.extend(
                    scanned
                        .events
                        .iter()
                        .filter(|e| e.is_lifecycle())
                        .map(|e| e.id.to_string()),
                );
            }
        }
    }
    let missing_event_ids: Vec<String> = expected_lifecycle_ids
        .into_iter()
        .filter(|id| !lifecycle_ids.contains(id))
        .collect();
    if !missing_event_ids.is_empty() {
        findings.push(Finding::LifecycleMismatch { missing_event_ids });
    }

    let mut indexes_regenerated = false;
    if fix {
        let _lifecycle_guard = locks.acquire(&["events__lifecycle"])?;
        regenerate_lifecycle(paths)?;
        drop(_lifecycle_guard);

        let _ids_guard = locks.acquire(&["ids_json"])?;
        regenerate_short_ids(paths)?;
        indexes_regenerated = true;
    }

    Ok(DoctorReport {
        findings,
        truncated_tails_fixed,
        indexes_regenerated,
    })
}

#[cfg(test)]
#[path = "doctor_tests.rs"]
mod tests;
