// SPDX-License-Identifier: MIT
//! Named file locks (spec §4.2): a multi-lock acquires a set of names in
//! lexicographic byte order and releases in reverse order, the way the
//! teacher's daemon lifecycle takes its PID-file lock via
//! `fs2::FileExt::try_lock_exclusive` — generalized here to N named locks
//! instead of one.

use fs2::FileExt;
use lattice_core::error::{LatticeError, Result};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Acquires named locks under a `locks/` directory.
///
/// **[EXPANSION]** Open Question: spec.md §5 requires a timeout signal
/// (`LockContention`'s "timeout variant") but leaves the duration
/// unspecified. This implementation polls `try_lock_exclusive` and gives
/// up after [`DEFAULT_TIMEOUT`] (configurable via [`LockManager::with_timeout`]),
/// recorded as a decision in `DESIGN.md`.
#[derive(Debug, Clone)]
pub struct LockManager {
    locks_dir: PathBuf,
    timeout: Duration,
}

impl LockManager {
    pub fn new(locks_dir: impl Into<PathBuf>) -> Self {
        Self {
            locks_dir: locks_dir.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.locks_dir.join(format!("{name}.lock"))
    }

    /// Acquire every named lock in `names`, sorted lexicographically, in
    /// that order. Returns a [`MultiLock`] that releases them in reverse
    /// order on drop.
    pub fn acquire(&self, names: &[&str]) -> Result<MultiLock> {
        std::fs::create_dir_all(&self.locks_dir)?;

        let mut sorted: Vec<&str> = names.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        for name in &sorted {
            let path = self.lock_path(name);
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)?;

            let deadline = Instant::now() + self.timeout;
            loop {
                match file.try_lock_exclusive() {
                    Ok(()) => break,
                    Err(_) if Instant::now() < deadline => {
                        debug!(lock = %name, "contended, waiting");
                        std::thread::sleep(POLL_INTERVAL);
                    }
                    Err(_) => {
                        warn!(lock = %name, "timed out acquiring lock");
                        // `held` drops here, releasing everything acquired so far.
                        return Err(LatticeError::LockTimeout(name.to_string()));
                    }
                }
            }
            held.push((name.to_string(), file));
        }

        Ok(MultiLock { held })
    }
}

/// A set of held named locks, released in reverse acquisition order on
/// drop (`fs2` also releases on file-handle close, so the explicit
/// `unlock` call is belt-and-suspenders, matching the teacher's reliance
/// on `File` drop for its own PID-file lock).
pub struct MultiLock {
    held: Vec<(String, File)>,
}

impl MultiLock {
    pub fn held_names(&self) -> Vec<&str> {
        self.held.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Drop for MultiLock {
    fn drop(&mut self) {
        for (name, file) in self.held.iter().rev() {
            if let Err(e) = fs2::FileExt::unlock(file) {
                warn!(lock = %name, error = %e, "failed to explicitly unlock, relying on close");
            }
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
