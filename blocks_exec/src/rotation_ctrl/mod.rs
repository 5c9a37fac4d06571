//! Rotation control module
//!
//! Drives an unregulated motor through a relative rotation by polling its tachometer. The motor is
//! started at the commanded power and sampled until one of the following happens:
//!
//! - the target is reached or overshot (`Completed`),
//! - the tachometer hasn't changed for the stall timeout (`Blocked`),
//! - the abort signal is raised (`Cancelled`).
//!
//! The motor is then braked or left to coast. Blocked and cancelled runs are not errors, callers
//! which only care about the original block behaviour can ignore the returned outcome.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod abort;
mod params;
mod state;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Internal
pub use abort::*;
pub use params::*;
pub use state::*;
pub use target::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of degrees in a full rotation.
pub const DEG_PER_ROTATION: i32 = 360;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a bounded rotation command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationOutcome {
    /// The command didn't request any movement, the motor wasn't touched.
    NoOp,

    /// The target was reached or overshot.
    Completed,

    /// The motor stopped moving before reaching the target.
    Blocked,

    /// The abort signal was raised.
    Cancelled
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of one bounded rotation command.
///
/// For a `NoOp` command all positions are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotationReport {
    pub outcome: RotationOutcome,

    /// Tachometer at the start of the command.
    ///
    /// Units: degrees
    pub start_position: i32,

    /// Tachometer value the command was aiming for.
    ///
    /// Units: degrees
    pub target_position: i32,

    /// Tachometer when the motor was stopped.
    ///
    /// Units: degrees
    pub end_position: i32,

    /// Number of tachometer samples taken by the polling loop.
    pub samples: u64,

    /// Time between starting and stopping the motor.
    pub elapsed: Duration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotationReport {

    /// The report of a command which did nothing.
    pub fn no_op() -> Self {
        Self {
            outcome: RotationOutcome::NoOp,
            start_position: 0,
            target_position: 0,
            end_position: 0,
            samples: 0,
            elapsed: Duration::from_secs(0)
        }
    }

    /// Degrees actually turned during the command.
    pub fn turned(&self) -> i32 {
        self.end_position.saturating_sub(self.start_position)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Total degrees of a rotations plus degrees command, rounding fractional rotations to the
/// nearest degree. Totals beyond the range of an `i32` saturate.
pub fn total_degrees(rotations: f32, degrees: i32) -> i32 {
    let rotation_degrees = (rotations as f64 * DEG_PER_ROTATION as f64).round() as i32;
    rotation_degrees.saturating_add(degrees)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_degrees() {
        assert_eq!(total_degrees(2.0, 30), 750);
        assert_eq!(total_degrees(0.5, 0), 180);
        assert_eq!(total_degrees(1.0e7, 90), i32::MAX);
        assert_eq!(total_degrees(-1.0e7, -90), i32::MIN);
        assert_eq!(total_degrees(0.0, i32::MAX), i32::MAX);
    }
}
