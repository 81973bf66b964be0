//! Microsecond time base for the scheduler.
//!
//! Timestamps are 32-bit microsecond counters that wrap after ~71.6 minutes.
//! Differences are taken with wrapping arithmetic, so they stay correct across
//! a single counter wrap but can only express about 35.8 minutes as a signed
//! value.

use tokio::time::Instant;

/// Source of the current time in microseconds
pub trait Clock: Send + Sync + 'static {
    /// Current time as a wrapping 32-bit microsecond counter
    fn now_us(&self) -> u32;
}

/// Clock counting microseconds since its creation
///
/// Backed by `tokio::time::Instant`, so paused-time tests advance it too.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u32 {
        // Truncation is the wrap
        self.origin.elapsed().as_micros() as u32
    }
}

#[cfg(test)]
pub use manual::ManualClock;
