//! Outbound (Driven) ports for the time controller.
//!
//! The controller never reads the system clock directly so that tests can
//! drive time deterministically.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current Unix time in seconds.
    fn now_seconds(&self) -> u64;
}

/// Default system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually driven clock for tests and deterministic simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `initial` seconds.
    pub fn new(initial: u64) -> Self {
        Self {
            seconds: AtomicU64::new(initial),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, seconds: u64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, seconds: u64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }
}
