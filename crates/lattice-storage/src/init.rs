// SPDX-License-Identifier: MIT
//! Project initialization (spec §4.1, §6): build the full `.lattice/`
//! tree, write defaults, and do nothing if it already exists.

use crate::fsio::{atomic_write, to_pretty_bytes};
use crate::paths::Paths;
use crate::shortid::ShortIdIndex;
use lattice_core::error::{LatticeError, Result};
use lattice_core::Config;
use std::fs;

/// Outcome of [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyInitialized,
}

/// Idempotently initialize `.lattice/` under `root`.
///
/// If `.lattice/` already exists as a directory, this is a no-op that
/// reports [`InitOutcome::AlreadyInitialized`]. If it exists as a
/// non-directory, fails with [`LatticeError::PathIsFile`].
pub fn init(root: &std::path::Path) -> Result<InitOutcome> {
    let paths = Paths::new(root);
    let lattice_dir = paths.lattice_dir();

    if lattice_dir.is_dir() {
        return Ok(InitOutcome::AlreadyInitialized);
    }
    if lattice_dir.exists() {
        return Err(LatticeError::PathIsFile(lattice_dir.display().to_string()));
    }

    for dir in paths.all_dirs() {
        fs::create_dir_all(&dir)?;
    }

    atomic_write(&paths.config_path(), &to_pretty_bytes(&Config::default())?)?;
    atomic_write(&paths.ids_path(), &to_pretty_bytes(&ShortIdIndex::empty())?)?;

    // Empty lifecycle log: touch the file so scans see zero lines, not a
    // missing file.
    if !paths.lifecycle_path().is_file() {
        fs::write(paths.lifecycle_path(), b"")?;
    }

    Ok(InitOutcome::Created)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
