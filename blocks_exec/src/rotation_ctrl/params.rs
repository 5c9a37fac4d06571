//! Parameters structure for RotationCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for rotation control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Time without any tachometer change after which the motor is
    /// considered blocked.
    ///
    /// Units: milliseconds
    pub stall_timeout_ms: u64,

    /// Time to sleep between tachometer samples.
    ///
    /// Units: milliseconds
    pub sample_interval_ms: u64,

    /// When fewer than this many degrees remain the loop only yields between
    /// samples instead of sleeping, to limit overshoot.
    ///
    /// Units: degrees
    pub fine_approach_deg: i32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            stall_timeout_ms: 500,
            sample_interval_ms: 1,
            fine_approach_deg: 10
        }
    }
}

impl Params {
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
