//! # Motor blocks
//!
//! Single motor programming blocks: Motor (regulated large and medium motors), Unregulated Motor,
//! and Motor Rotation (tachometer reading and reset).
//!
//! Each block owns its actuator. The actuator is stopped and closed exactly once, either by an
//! explicit call to [`MotorBlock::close`] or when the block is dropped. Commanding a block after it
//! has been closed is a programming error and returns [`MotorError::ActuatorUnavailable`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod regulated;
mod unregulated;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::actuator::ActuatorError;
use crate::rotation_ctrl::{RotationReport, DEG_PER_ROTATION};
use util::time::{seconds_to_duration, Clock};

pub use regulated::*;
pub use unregulated::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Operations shared by every single motor block.
///
/// Power is a percentage in `[-100, 100]`, negative runs backwards. Integer and fractional inputs
/// share one entry point, fractional rotations are rounded to the nearest degree.
pub trait MotorBlock {

    /// Name of the port the motor is connected to.
    fn port_name(&self) -> &str;

    /// Start the motor and return immediately.
    fn motor_on(&mut self, power: f32) -> Result<(), MotorError>;

    /// Run the motor for a number of seconds then stop it.
    fn motor_on_for_seconds(
        &mut self,
        power: f32,
        seconds: f32,
        brake: bool
    ) -> Result<(), MotorError>;

    /// Run the motor for `rotations * 360 + degrees` degrees then stop it.
    fn motor_on_for_rotations_degrees(
        &mut self,
        power: f32,
        rotations: f32,
        degrees: i32,
        brake: bool
    ) -> Result<RotationReport, MotorError>;

    /// Run the motor for a number of degrees then stop it.
    fn motor_on_for_degrees(
        &mut self,
        power: f32,
        degrees: i32,
        brake: bool
    ) -> Result<RotationReport, MotorError> {
        self.motor_on_for_rotations_degrees(power, 0.0, degrees, brake)
    }

    /// Run the motor for a number of rotations then stop it.
    fn motor_on_for_rotations(
        &mut self,
        power: f32,
        rotations: f32,
        brake: bool
    ) -> Result<RotationReport, MotorError> {
        self.motor_on_for_rotations_degrees(power, rotations, 0, brake)
    }

    /// Stop the motor, holding position if `brake` is set.
    fn motor_off(&mut self, brake: bool) -> Result<(), MotorError>;

    /// Motor Rotation block: reset the tachometer to zero.
    fn rotation_reset(&mut self) -> Result<(), MotorError>;

    /// Motor Rotation block: degrees turned since the last reset.
    fn measure_degrees(&mut self) -> Result<i32, MotorError>;

    /// Motor Rotation block: rotations turned since the last reset.
    fn measure_rotations(&mut self) -> Result<f32, MotorError> {
        Ok(self.measure_degrees()? as f32 / DEG_PER_ROTATION as f32)
    }

    /// Motor Rotation block: current power level of the motor.
    fn measure_current_power(&mut self) -> Result<f32, MotorError>;

    /// Stop the motor then release the actuator. Further commands fail.
    fn close(&mut self) -> Result<(), MotorError>;

    /// True once the actuator has been released.
    fn is_closed(&self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by motor blocks.
#[derive(thiserror::Error, Debug)]
pub enum MotorError {
    #[error("The motor on port {port} has been closed and can no longer be commanded")]
    ActuatorUnavailable {
        port: String
    },

    #[error(transparent)]
    Actuator(#[from] ActuatorError)
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Wait block: block the caller for the given number of seconds. Negative waits are treated as
/// zero.
pub fn wait_time<C: Clock + ?Sized>(clock: &C, seconds: f32) {
    clock.sleep(seconds_to_duration(seconds))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Borrow an actuator which hasn't been released yet.
pub(crate) fn available<'a, A>(
    actuator: &'a mut Option<A>,
    port: &str
) -> Result<&'a mut A, MotorError> {
    actuator.as_mut().ok_or_else(|| MotorError::ActuatorUnavailable {
        port: port.to_string()
    })
}
