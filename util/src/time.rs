//! General time utility functions
//!
//! Blocking commands read time through the [`Clock`] trait so that they can be
//! driven either by the host's monotonic clock or by a simulated clock which
//! only advances when it is asked to sleep.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Time a [`SimClock`] advances on each yield unless told otherwise. Must be
/// non-zero so that loops which only yield still see time pass.
pub const DEFAULT_SIM_YIELD_STEP: Duration = Duration::from_micros(10);

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic time source which can also block the calling thread.
pub trait Clock {
    /// Time elapsed since the clock's own epoch.
    fn now(&self) -> Duration;

    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: Duration);

    /// Give up the remainder of the current time slice.
    fn yield_now(&self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant
}

/// Simulated clock.
///
/// Time only moves forward when `sleep` is called, or by `yield_step` on each
/// `yield_now`. Clones share the same time base.
#[derive(Debug, Clone)]
pub struct SimClock {
    nanos: Arc<AtomicU64>,
    yield_step_nanos: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }

    fn yield_now(&self) {
        thread::yield_now()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::with_yield_step(DEFAULT_SIM_YIELD_STEP)
    }
}

impl SimClock {
    /// Create a new simulated clock starting at zero, advancing by
    /// [`DEFAULT_SIM_YIELD_STEP`] on every yield.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simulated clock which advances by `step` on every yield.
    pub fn with_yield_step(step: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            yield_step_nanos: step.as_nanos() as u64
        }
    }

    /// Move the clock forward without going through `sleep`.
    pub fn advance(&self, duration: Duration) {
        self.nanos.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration)
    }

    fn yield_now(&self) {
        self.nanos.fetch_add(self.yield_step_nanos, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    if let Some(ns) = duration.num_nanoseconds() {
        Some(ns as f64 / NANOS_PER_SECOND as f64)
    }
    else {
        None
    }
}

/// Convert a (possibly negative or non-finite) number of seconds into a
/// duration, treating anything that isn't a positive number as zero.
pub fn seconds_to_duration(seconds: f32) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f32(seconds)
    }
    else {
        Duration::from_secs(0)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
