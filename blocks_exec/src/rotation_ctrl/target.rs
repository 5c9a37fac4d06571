//! Rotation target and stall tracking

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;

use crate::actuator::Direction;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The tachometer value a bounded rotation is driving towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationTarget {
    /// Units: degrees
    pub start_position: i32,

    /// Distance to turn, in the direction of travel.
    ///
    /// Units: degrees
    pub target_delta: i32,

    pub direction: Direction,

    /// Units: degrees
    pub target_position: i32
}

/// Tracks how long the tachometer has been stuck on one value.
#[derive(Debug, Clone, Copy)]
pub struct StallTracker {
    last_position: i32,
    last_change: Duration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotationTarget {
    pub fn new(start_position: i32, target_delta: i32, direction: Direction) -> Self {
        Self {
            start_position,
            target_delta,
            direction,
            target_position: start_position
                .saturating_add(direction.sign().saturating_mul(target_delta))
        }
    }

    /// Degrees still to go from `current`. Zero or negative once the target
    /// has been reached or overshot.
    pub fn pending(&self, current: i32) -> i32 {
        match self.direction {
            Direction::Forward => self.target_position.saturating_sub(current),
            Direction::Backward => current.saturating_sub(self.target_position)
        }
    }
}

impl StallTracker {
    pub fn new(position: i32, now: Duration) -> Self {
        Self {
            last_position: position,
            last_change: now
        }
    }

    /// Record a new sample and return how long the position has been
    /// unchanged (zero if it just moved).
    pub fn observe(&mut self, position: i32, now: Duration) -> Duration {
        if position != self.last_position {
            self.last_position = position;
            self.last_change = now;
        }

        now.checked_sub(self.last_change).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
