// SPDX-License-Identifier: MIT
//! Filesystem primitives (spec §4.1): atomic replace, JSONL append, and
//! deterministic (de)serialization helpers. `write_all` already retries on
//! partial writes and `ErrorKind::Interrupted` per its documented
//! contract, so there is no hand-rolled retry loop here — just the
//! temp-file-then-rename dance and the fsync that makes it durable.

use lattice_core::error::{LatticeError, Result};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Atomically replace `path`'s contents with `bytes`.
///
/// Writes to a sibling temp file in the same directory (so the final
/// rename is same-filesystem and therefore atomic), fsyncs it, then
/// renames over the target. The temp file is removed on any failure
/// after creation.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let Some(parent) = parent else {
        return Err(LatticeError::ParentMissing(path.display().to_string()));
    };
    if !parent.is_dir() {
        return Err(LatticeError::ParentMissing(path.display().to_string()));
    }
    if path.is_dir() {
        return Err(LatticeError::PathIsFile(path.display().to_string()));
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        std::process::id()
    ));

    let result = (|| -> Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Append one line to a JSONL log, flushing before returning. Callers hold
/// the owning named lock for the duration of this call.
pub fn append_jsonl_line(path: &Path, line: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(LatticeError::ParentMissing(path.display().to_string()));
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line)?;
    file.write_all(b"\n")?;
    file.flush()?;
    debug!(path = %path.display(), "appended jsonl line");
    Ok(())
}

/// Serialize a value as a snapshot/metadata file: sorted keys (free from
/// `serde_json`'s default, non-`preserve_order` `Map`), 2-space indent,
/// terminal newline.
pub fn to_pretty_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Serialize a value as one compact JSONL line (no trailing newline — the
/// caller appends one).
pub fn to_compact_line<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Read and parse a pretty-printed JSON file, if it exists.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let value = serde_json::from_slice(&bytes)?;
    Ok(Some(value))
}

#[cfg(test)]
#[path = "fsio_tests.rs"]
mod tests;
