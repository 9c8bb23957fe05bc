// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source abstraction.
//!
//! Services never read `SystemTime` directly; they take a [`Clock`] so
//! tests can pin timestamps and steer time deterministically.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Where the services get "now" from.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock that only moves when told to.
///
/// Clones share the underlying value, so a fixture hands copies to every
/// service and advances them all at once.
#[derive(Clone)]
pub struct FakeClock {
    ms: Arc<Mutex<u64>>,
}

impl FakeClock {
    /// Starts at a fixed epoch (1 000 000 ms) so timestamps in assertions
    /// stay readable.
    pub fn new() -> Self {
        Self { ms: Arc::new(Mutex::new(1_000_000)) }
    }

    pub fn advance(&self, by: Duration) {
        self.advance_ms(by.as_millis() as u64);
    }

    pub fn advance_ms(&self, by: u64) {
        *self.ms.lock() += by;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        *self.ms.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        *self.ms.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
