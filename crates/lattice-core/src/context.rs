// SPDX-License-Identifier: MIT
//! The bundle of ambient inputs the write pipeline needs but must never
//! read directly from global state (spec §9): the project root, its
//! config, a clock, and an ID generator. Passed explicitly end to end so
//! the pure core stays pure and the storage layer stays testable.

use crate::clock::Clock;
use crate::config::Config;
use crate::id::IdGen;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a write needs that isn't in the request itself.
#[derive(Clone)]
pub struct Context {
    root: PathBuf,
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
}

impl Context {
    pub fn new(
        root: impl Into<PathBuf>,
        config: Config,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
    ) -> Self {
        Self {
            root: root.into(),
            config: Arc::new(config),
            clock,
            id_gen,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn id_gen(&self) -> &dyn IdGen {
        self.id_gen.as_ref()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
