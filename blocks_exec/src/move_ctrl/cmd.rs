//! Commands passed into MoveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A Move Steering command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteeringCommand {

    /// Amount of steering, positive turns right, negative turns left. At +/-50 the inner wheel
    /// stops, at +/-100 the robot turns on the spot.
    ///
    /// Units: percent, clamped to [-100, 100]
    pub steering: f32,

    /// Units: percent, clamped to [-100, 100]
    pub power: f32
}

/// A Move Tank command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TankCommand {
    /// Units: percent, clamped to [-100, 100]
    pub left: f32,

    /// Units: percent, clamped to [-100, 100]
    pub right: f32
}

/// Power demands for the left and right drive motors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MotorPowerPair {
    /// Units: percent
    pub left: f32,

    /// Units: percent
    pub right: f32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SteeringCommand {
    pub fn new(steering: f32, power: f32) -> Self {
        Self { steering, power }
    }

    /// Mix the command into left and right powers.
    pub fn resolve(&self) -> MotorPowerPair {
        super::calc_steering(self)
    }
}

impl TankCommand {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    pub fn resolve(&self) -> MotorPowerPair {
        super::calc_tank(self)
    }
}

impl MotorPowerPair {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// The same pair with left and right exchanged.
    pub fn swap(self) -> Self {
        Self {
            left: self.right,
            right: self.left
        }
    }

    /// The larger of the two power magnitudes.
    pub fn max_abs(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}
