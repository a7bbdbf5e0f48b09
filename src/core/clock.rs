//! Shared logical time.
//!
//! The runtime owns one clock and advances it once per tick. Channels hold a
//! clone so `last_raised_time` reports scene time rather than wall time.

use std::cell::Cell;
use std::rc::Rc;

/// Tolerance used when comparing accumulated tick time against a duration.
///
/// Summing frame deltas (0.1 + 0.1 + ...) drifts below the exact total; a
/// timer whose accumulator is within this distance of its duration counts
/// as elapsed.
pub const TIME_EPSILON: f32 = 1e-5;

/// Check whether an accumulator has reached a duration.
#[must_use]
pub fn reached(elapsed: f32, duration: f32) -> bool {
    elapsed + TIME_EPSILON >= duration
}

/// Cheaply clonable handle to a logical clock, in seconds.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    now: Rc<Cell<f64>>,
}

impl Clock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Advance the clock. Negative deltas are ignored.
    pub fn advance(&self, dt: f32) {
        if dt > 0.0 {
            self.now.set(self.now.get() + f64::from(dt));
        }
    }

    /// Rewind to zero.
    pub fn reset(&self) {
        self.now.set(0.0);
    }
}
