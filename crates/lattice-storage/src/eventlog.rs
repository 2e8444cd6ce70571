// SPDX-License-Identifier: MIT
//! Reading a per-task (or lifecycle) JSONL event log back into typed
//! [`Event`]s, the way the teacher's `storage::wal` distinguishes a clean
//! parse from a truncated tail (spec §4.6: "ignore an at-most-one truncated
//! trailing line").

use lattice_core::error::{LatticeError, Result};
use lattice_core::Event;
use std::fs;
use std::path::Path;

/// The result of scanning one JSONL log file.
pub struct ScannedLog {
    pub events: Vec<Event>,
    /// True if the last line was present but failed to parse — tolerated
    /// here, repaired by `doctor --fix`.
    pub truncated_tail: bool,
}

/// Parse every line of `path` as one JSON [`Event`] per line. A parse
/// failure on any line but the last is a hard integrity error: only the
/// final line may be a crash-truncated partial write (spec §4.6). Returns
/// `Ok(None)` if the file doesn't exist.
pub fn scan_log(path: &Path) -> Result<Option<ScannedLog>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LatticeError::from(e)),
    };

    let lines: Vec<&str> = raw.lines().filter(|l| !l.is_empty()).collect();
    let mut events = Vec::with_capacity(lines.len());
    let mut truncated_tail = false;

    for (i, line) in lines.iter().enumerate() {
        match serde_json::from_str::<Event>(line) {
            Ok(event) => events.push(event),
            Err(e) if i == lines.len() - 1 => {
                truncated_tail = true;
                tracing::warn!(path = %path.display(), error = %e, "truncated trailing line");
            }
            Err(e) => {
                return Err(LatticeError::Integrity(format!(
                    "{}: corrupt event on line {} (not the final line): {e}",
                    path.display(),
                    i + 1
                )));
            }
        }
    }

    Ok(Some(ScannedLog {
        events,
        truncated_tail,
    }))
}

/// Rewrite `path` keeping only its first `keep_lines` lines, used by
/// `doctor --fix` to trim a truncated trailing line. Atomic: builds the new
/// content in memory and replaces the file via [`crate::fsio::atomic_write`].
pub fn trim_to_line_count(path: &Path, keep_lines: usize) -> Result<()> {
    let raw = fs::read_to_string(path)?;
    let mut out = String::new();
    for line in raw.lines().filter(|l| !l.is_empty()).take(keep_lines) {
        out.push_str(line);
        out.push('\n');
    }
    crate::fsio::atomic_write(path, out.as_bytes())
}

#[cfg(test)]
#[path = "eventlog_tests.rs"]
mod tests;
