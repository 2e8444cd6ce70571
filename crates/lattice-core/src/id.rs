// SPDX-License-Identifier: MIT
//! ID generation and the prefixed-newtype ID types named in spec §3.1/§6:
//! `task_<ULID>`, `ev_<ULID>`, `art_<ULID>`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use ulid::Ulid;

/// Define a newtype ID wrapper around `String` with a fixed prefix.
///
/// Generates `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>` impls, plus a
/// `generate()` constructor that stamps a fresh ULID behind the prefix.
macro_rules! define_prefixed_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident = $prefix:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh ID using the given [`IdGen`].
            pub fn generate(gen: &dyn IdGen) -> Self {
                Self(format!("{}{}", $prefix, gen.next_ulid()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if `s` has this ID type's prefix.
            pub fn has_prefix(s: &str) -> bool {
                s.starts_with($prefix)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_prefixed_id! {
    /// Opaque, immutable task identifier (`task_<ULID>`).
    pub struct TaskId = "task_";
}

define_prefixed_id! {
    /// Immutable event identifier (`ev_<ULID>`).
    pub struct EventId = "ev_";
}

define_prefixed_id! {
    /// Immutable artifact identifier (`art_<ULID>`).
    pub struct ArtifactId = "art_";
}

/// Generates the ULIDs behind prefixed IDs.
///
/// Abstracted so the write pipeline and event constructor never call
/// `Ulid::new()` directly — tests substitute [`SequentialIdGen`] for
/// deterministic, monotonically increasing IDs.
pub trait IdGen: Send + Sync {
    fn next_ulid(&self) -> Ulid;
}

/// Production generator: a fresh random ULID per call.
#[derive(Clone, Copy, Default)]
pub struct UlidIdGen;

impl IdGen for UlidIdGen {
    fn next_ulid(&self) -> Ulid {
        Ulid::new()
    }
}

/// Deterministic generator for tests: monotonically increasing ULIDs
/// derived from a counter, so replay/idempotency tests can assert on
/// exact ID sequences.
#[derive(Clone)]
pub struct SequentialIdGen {
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGen for SequentialIdGen {
    fn next_ulid(&self) -> Ulid {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ulid::from_parts(n, 0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
