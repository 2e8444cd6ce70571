// SPDX-License-Identifier: MIT
//! The closed error taxonomy surfaced at the core's boundary.

use thiserror::Error;

/// Errors produced by the event/snapshot algebra and the storage layer
/// built on top of it.
///
/// This is a closed set: the core never panics on a condition that can
/// be produced by user input, disk state, or concurrent contention, and
/// it never introduces ad-hoc variants at call sites. I/O and
/// serialization failures are wrapped into [`LatticeError::Io`] /
/// [`LatticeError::Integrity`] at the boundary where they occur rather
/// than leaking raw `std::io::Error` / `serde_json::Error` types.
#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid actor: {0}")]
    InvalidActor(String),

    #[error("protected field: {0}")]
    ProtectedField(String),

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("lock contention on {0}")]
    LockContention(String),

    #[error("lock timed out waiting for {0}")]
    LockTimeout(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("parent directory missing for {0}")]
    ParentMissing(String),

    #[error("path exists and is not a directory: {0}")]
    PathIsFile(String),
}

impl From<std::io::Error> for LatticeError {
    fn from(e: std::io::Error) -> Self {
        LatticeError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for LatticeError {
    fn from(e: serde_json::Error) -> Self {
        LatticeError::Integrity(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LatticeError>;
