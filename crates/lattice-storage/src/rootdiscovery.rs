// SPDX-License-Identifier: MIT
//! Root discovery (spec §4.1, §6): locate the project directory containing
//! `.lattice/`, either by walking up from a starting directory or via an
//! explicit environment override that must be exactly right or fail hard.

use crate::paths::LATTICE_DIR;
use lattice_core::error::{LatticeError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit project root, bypassing walk-up.
pub const ROOT_OVERRIDE_VAR: &str = "LATTICE_ROOT";

fn contains_lattice_dir(dir: &Path) -> bool {
    dir.join(LATTICE_DIR).is_dir()
}

/// Resolve the project root containing `.lattice/`.
///
/// If [`ROOT_OVERRIDE_VAR`] is set, it is authoritative: empty string or a
/// directory that does not contain `.lattice/` is a hard error, never a
/// fallback to walk-up. Otherwise walks upward from `start` (default: the
/// current working directory) until a `.lattice/` directory is found,
/// returning `Ok(None)` if the filesystem root is reached without one.
pub fn find_root(start: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(override_value) = std::env::var_os(ROOT_OVERRIDE_VAR) {
        let raw = override_value.to_string_lossy().to_string();
        if raw.is_empty() {
            return Err(LatticeError::Config(format!(
                "{ROOT_OVERRIDE_VAR} is set to an empty string"
            )));
        }
        let override_path = PathBuf::from(&raw);
        if !override_path.is_dir() {
            return Err(LatticeError::Config(format!(
                "{ROOT_OVERRIDE_VAR} points to '{raw}', which is not an existing directory"
            )));
        }
        if !contains_lattice_dir(&override_path) {
            return Err(LatticeError::Config(format!(
                "{ROOT_OVERRIDE_VAR} directory '{raw}' does not contain {LATTICE_DIR}"
            )));
        }
        return Ok(Some(override_path));
    }

    let start = match start {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let mut current = start.canonicalize().unwrap_or(start);

    loop {
        if contains_lattice_dir(&current) {
            return Ok(Some(current));
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "rootdiscovery_tests.rs"]
mod tests;
