// SPDX-License-Identifier: MIT
//! Clock abstraction so the write pipeline never reads the system clock
//! directly — tests supply a [`FakeClock`] instead.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at a fixed instant and advances
/// only when told to.
#[derive(Debug, Clone)]
pub struct FakeClock {
    current: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: std::sync::Arc::new(std::sync::Mutex::new(start)),
        }
    }

    /// Advance the clock by `seconds` and return the new value.
    pub fn advance(&self, seconds: i64) -> DateTime<Utc> {
        let mut guard = self.current.lock().expect("fake clock mutex poisoned");
        *guard += chrono::Duration::seconds(seconds);
        *guard
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("valid fixed timestamp")
                .with_timezone(&Utc),
        )
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().expect("fake clock mutex poisoned")
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
