//! Unregulated Motor block

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;
use log::{debug, trace, warn};

use super::{available, wait_time, MotorBlock, MotorError};
use crate::actuator::{Actuator, Direction};
use crate::rotation_ctrl::{
    self, AbortSignal, NeverAbort, RotationCmd, RotationCtrl, RotationOutcome, RotationReport
};
use util::maths::clamp_percent;
use util::time::{Clock, SystemClock};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A motor driven with raw power only.
///
/// Bounded rotations use the polling loop in [`RotationCtrl`], which ends early if the motor is
/// blocked or the abort signal is raised.
pub struct UnregulatedMotor<A: Actuator, C: Clock = SystemClock> {
    port: String,
    actuator: Option<A>,
    clock: C,
    ctrl: RotationCtrl,
    abort: Arc<dyn AbortSignal + Send + Sync>,

    /// Last commanded power, signed.
    power: f32
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<A: Actuator, C: Clock> UnregulatedMotor<A, C> {

    /// Create a new unregulated motor block owning `actuator`.
    pub fn new(actuator: A, clock: C, params: rotation_ctrl::Params) -> Self {
        let port = actuator.port_name().to_string();
        debug!("Unregulated motor opened on port {}", port);

        Self {
            port,
            actuator: Some(actuator),
            clock,
            ctrl: RotationCtrl::new(params),
            abort: Arc::new(NeverAbort),
            power: 0.0
        }
    }

    /// Use the given emergency stop signal for bounded rotations.
    pub fn with_abort(mut self, abort: Arc<dyn AbortSignal + Send + Sync>) -> Self {
        self.abort = abort;
        self
    }

    /// Parameters used for bounded rotations.
    pub fn rotation_params(&self) -> &rotation_ctrl::Params {
        self.ctrl.params()
    }
}

impl<A: Actuator, C: Clock> MotorBlock for UnregulatedMotor<A, C> {

    fn port_name(&self) -> &str {
        &self.port
    }

    fn motor_on(&mut self, power: f32) -> Result<(), MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;
        let power = clamp_percent(power);

        actuator.set_power(power.abs())?;
        actuator.start(Direction::from_power(power))?;
        self.power = power;

        Ok(())
    }

    fn motor_on_for_seconds(
        &mut self,
        power: f32,
        seconds: f32,
        brake: bool
    ) -> Result<(), MotorError> {
        trace!("{} on for {} sec", self.port, seconds);

        self.motor_on(power)?;
        wait_time(&self.clock, seconds);
        self.motor_off(brake)
    }

    fn motor_on_for_rotations_degrees(
        &mut self,
        power: f32,
        rotations: f32,
        degrees: i32,
        brake: bool
    ) -> Result<RotationReport, MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;

        let report = self.ctrl.run(
            actuator,
            &self.clock,
            &self.abort,
            &RotationCmd { power, rotations, degrees, brake }
        )?;

        if report.outcome != RotationOutcome::NoOp {
            self.power = clamp_percent(power);
        }

        Ok(report)
    }

    fn motor_off(&mut self, brake: bool) -> Result<(), MotorError> {
        available(&mut self.actuator, &self.port)?.stop(brake)?;
        Ok(())
    }

    fn rotation_reset(&mut self) -> Result<(), MotorError> {
        available(&mut self.actuator, &self.port)?.reset_position()?;
        Ok(())
    }

    fn measure_degrees(&mut self) -> Result<i32, MotorError> {
        Ok(available(&mut self.actuator, &self.port)?.position()?)
    }

    /// The last commanded power, unregulated motors have no speed feedback.
    fn measure_current_power(&mut self) -> Result<f32, MotorError> {
        available(&mut self.actuator, &self.port)?;
        Ok(self.power)
    }

    fn close(&mut self) -> Result<(), MotorError> {
        if let Some(mut actuator) = self.actuator.take() {
            debug!("Closing unregulated motor on port {}", self.port);

            let stopped = actuator.stop(true);
            let closed = actuator.close();
            stopped?;
            closed?;
        }

        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.actuator.is_none()
    }
}

impl<A: Actuator, C: Clock> Drop for UnregulatedMotor<A, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to release motor on port {}: {}", self.port, e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
