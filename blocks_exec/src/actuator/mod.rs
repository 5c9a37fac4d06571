//! # Actuator capability
//!
//! This module provides the interface through which blocks command motors.
//! Hardware drivers live outside this crate and are reached only through the
//! [`Actuator`] and [`RegulatedActuator`] traits. A simulated implementation
//! is provided in [`sim`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulated actuators used by tests and by the executable.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Raw motor actuator: power control, tachometer and stop.
///
/// Unregulated motors only have this capability, so bounded rotations have to be achieved by
/// polling [`Actuator::position`].
pub trait Actuator {

    /// Name of the port the actuator is connected to (e.g. `"A"`).
    fn port_name(&self) -> &str;

    /// Start driving in the given direction at the current power level.
    fn start(&mut self, direction: Direction) -> Result<(), ActuatorError>;

    /// Set the power level.
    ///
    /// ## Arguments
    /// - `level` - Power magnitude between 0 and 100. The direction is given by
    ///   [`Actuator::start`].
    fn set_power(&mut self, level: f32) -> Result<(), ActuatorError>;

    /// Stop the motor. If `brake` is true the motor actively holds its position, otherwise power
    /// is removed and it coasts.
    fn stop(&mut self, brake: bool) -> Result<(), ActuatorError>;

    /// Read the tachometer, in degrees since the last reset.
    fn position(&mut self) -> Result<i32, ActuatorError>;

    /// Reset the tachometer to zero.
    fn reset_position(&mut self) -> Result<(), ActuatorError>;

    /// Release the underlying hardware. No other method may be called afterwards.
    fn close(&mut self) -> Result<(), ActuatorError>;
}

/// Motor with closed loop speed and position control.
pub trait RegulatedActuator: Actuator {

    /// Maximum achievable speed in degrees/second.
    fn max_speed(&self) -> f32;

    /// Set the regulated speed in degrees/second. The sign is ignored.
    fn set_speed(&mut self, deg_per_s: f32) -> Result<(), ActuatorError>;

    /// Speed the regulator is currently targeting in degrees/second.
    fn speed(&self) -> f32;

    /// Set the acceleration limit in degrees/second^2.
    fn set_acceleration(&mut self, deg_per_s2: u32) -> Result<(), ActuatorError>;

    /// Rotate by a relative number of degrees (negative is backwards) at the current speed.
    ///
    /// The motor always holds its position once the rotation is complete. If `immediate_return`
    /// is set this returns once the move has started, use [`RegulatedActuator::wait_complete`] to
    /// block until it is done.
    fn rotate(&mut self, degrees: i32, immediate_return: bool) -> Result<(), ActuatorError>;

    /// Block until any rotation in progress is complete.
    fn wait_complete(&mut self) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Direction of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward
}

/// Errors reported by an actuator.
#[derive(thiserror::Error, Debug)]
pub enum ActuatorError {
    #[error("Actuator on port {0} is not connected")]
    NotConnected(String),

    #[error("Actuator on port {0} has been closed")]
    Closed(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Direction {

    /// Direction of travel for a power level. Only strictly positive power drives forwards.
    pub fn from_power(power: f32) -> Self {
        if power > 0.0 {
            Direction::Forward
        }
        else {
            Direction::Backward
        }
    }

    /// `+1` for forwards, `-1` for backwards.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_power() {
        assert_eq!(Direction::from_power(30.0), Direction::Forward);
        assert_eq!(Direction::from_power(-0.5), Direction::Backward);
        assert_eq!(Direction::from_power(0.0), Direction::Backward);
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }
}
