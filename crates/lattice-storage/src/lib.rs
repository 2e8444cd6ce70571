// SPDX-License-Identifier: MIT
//! The storage engine: everything [`lattice_core`]'s pure algebra needs to
//! touch disk — paths, atomic writes, locking, root discovery, short-ID
//! allocation, hook dispatch, the write pipeline, and the integrity
//! services (rebuild, doctor, archive/unarchive) built on top of it.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod api;
pub mod archive;
pub mod doctor;
pub mod eventlog;
pub mod fsio;
pub mod hooks;
pub mod init;
pub mod lock;
pub mod paths;
pub mod rebuild;
pub mod rootdiscovery;
pub mod shortid;
pub mod write_pipeline;

pub use api::*;
pub use lock::{LockManager, MultiLock};
pub use paths::{Paths, LATTICE_DIR};
pub use rootdiscovery::ROOT_OVERRIDE_VAR;
