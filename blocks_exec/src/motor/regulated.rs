//! Regulated Motor block (large and medium motors)

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::{available, wait_time, MotorBlock, MotorError};
use crate::actuator::{Direction, RegulatedActuator};
use crate::rotation_ctrl::{total_degrees, RotationOutcome, RotationReport};
use util::maths::{clamp_percent, lin_map};
use util::time::{Clock, SystemClock};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Acceleration limit applied when a regulated motor is opened.
///
/// Units: degrees/second^2
pub const DEFAULT_ACCELERATION: u32 = 2000;

/// Window over which the tachometer is sampled to measure the current power.
pub const POWER_SAMPLE_WINDOW: Duration = Duration::from_millis(99);

/// Number of sample windows per second, used to scale the measured difference to a speed.
const POWER_SAMPLE_SCALE: f32 = 10.0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Type of regulated motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorKind {
    Large,
    Medium
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A speed regulated motor.
///
/// Power is converted to a target speed as a percentage of the actuator's maximum speed. Bounded
/// rotations are delegated to the actuator's own regulator, which always holds position once done,
/// so a coast request floats the motor afterwards.
pub struct RegulatedMotor<A: RegulatedActuator, C: Clock = SystemClock> {
    port: String,
    kind: MotorKind,
    actuator: Option<A>,
    clock: C
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<A: RegulatedActuator, C: Clock> RegulatedMotor<A, C> {

    /// Open a regulated motor, limiting its acceleration to [`DEFAULT_ACCELERATION`].
    pub fn new(kind: MotorKind, mut actuator: A, clock: C) -> Result<Self, MotorError> {
        let port = actuator.port_name().to_string();

        actuator.set_acceleration(DEFAULT_ACCELERATION)?;

        debug!("{:?} motor opened on port {}", kind, port);

        Ok(Self {
            port,
            kind,
            actuator: Some(actuator),
            clock
        })
    }

    pub fn kind(&self) -> MotorKind {
        self.kind
    }

    /// Start a rotation of `degrees` (negative is backwards) at `power` and return without
    /// waiting for it to finish. A zero rotation does nothing.
    pub fn start_rotation(&mut self, power: f32, degrees: i32) -> Result<(), MotorError> {
        if degrees == 0 {
            return Ok(())
        }

        let actuator = available(&mut self.actuator, &self.port)?;
        set_power(actuator, power)?;
        actuator.rotate(degrees, true)?;

        Ok(())
    }

    /// Wait for a rotation started by [`RegulatedMotor::start_rotation`] to finish, then float the
    /// motor unless `brake` is set.
    pub fn finish_rotation(&mut self, brake: bool) -> Result<(), MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;

        actuator.wait_complete()?;
        if !brake {
            actuator.stop(false)?;
        }

        Ok(())
    }

    /// Power the regulator is currently targeting, as a percentage of the maximum speed.
    pub fn target_power(&mut self) -> Result<f32, MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;
        Ok(100.0 * actuator.speed() / actuator.max_speed())
    }
}

impl<A: RegulatedActuator, C: Clock> MotorBlock for RegulatedMotor<A, C> {

    fn port_name(&self) -> &str {
        &self.port
    }

    fn motor_on(&mut self, power: f32) -> Result<(), MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;

        set_power(actuator, power)?;

        // Zero power only changes the speed
        if power != 0.0 {
            actuator.start(Direction::from_power(power))?;
        }

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
        let mut degrees = total_degrees(rotations, degrees);

        // Negative power turns a positive distance backwards, a negative distance is already
        // backwards
        if power < 0.0 && degrees > 0 {
            degrees = -degrees;
        }

        if degrees == 0 {
            return Ok(RotationReport::no_op())
        }

        let actuator = available(&mut self.actuator, &self.port)?;
        let start_time = self.clock.now();
        let start_position = actuator.position()?;

        set_power(actuator, power)?;

        trace!("{} rotate {} deg", self.port, degrees);

        // The regulator always holds after a rotation
        actuator.rotate(degrees, false)?;
        if !brake {
            actuator.stop(false)?;
        }

        let end_position = actuator.position()?;

        Ok(RotationReport {
            outcome: RotationOutcome::Completed,
            start_position,
            target_position: start_position.saturating_add(degrees),
            end_position,
            samples: 0,
            elapsed: self.clock.now().checked_sub(start_time).unwrap_or_default()
        })
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

    /// Measured speed over a short window as a percentage of the maximum speed. Blocks the caller
    /// for [`POWER_SAMPLE_WINDOW`].
    fn measure_current_power(&mut self) -> Result<f32, MotorError> {
        let actuator = available(&mut self.actuator, &self.port)?;

        let start = actuator.position()?;
        self.clock.sleep(POWER_SAMPLE_WINDOW);
        let diff = actuator.position()?.saturating_sub(start).saturating_abs();

        let speed = POWER_SAMPLE_SCALE * diff as f32;

        Ok(100.0 * speed / actuator.max_speed())
    }

    fn close(&mut self) -> Result<(), MotorError> {
        if let Some(mut actuator) = self.actuator.take() {
            debug!("Closing {:?} motor on port {}", self.kind, self.port);

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

impl<A: RegulatedActuator, C: Clock> Drop for RegulatedMotor<A, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to release motor on port {}: {}", self.port, e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set the regulated speed for a power percentage, clamped to [-100, 100]. The sign is dropped.
fn set_power<A: RegulatedActuator + ?Sized>(actuator: &mut A, power: f32) -> Result<(), MotorError> {
    let speed = lin_map((0.0, 100.0), (0.0, actuator.max_speed()), clamp_percent(power).abs());
    actuator.set_speed(speed)?;
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::sim::{SimEvent, SimHandle, SimMotor};
    use util::time::SimClock;

    fn motor() -> (RegulatedMotor<SimMotor, SimClock>, SimHandle, SimClock) {
        let sim = SimMotor::new("B");
        let handle = sim.handle();
        let clock = SimClock::new();
        let m = RegulatedMotor::new(MotorKind::Large, sim, clock.clone()).unwrap();
        (m, handle, clock)
    }

    /// Events after the acceleration set at construction.
    fn commands(sim: &SimHandle) -> Vec<SimEvent> {
        sim.events().into_iter().skip(1).collect()
    }

    #[test]
    fn test_acceleration_limited_on_open() {
        let (m, sim, _) = motor();

        assert_eq!(m.kind(), MotorKind::Large);
        assert_eq!(sim.acceleration(), DEFAULT_ACCELERATION);
    }

    #[test]
    fn test_rotation_with_brake_holds() {
        let (mut m, sim, _) = motor();

        let report = m.motor_on_for_rotations_degrees(50.0, 2.0, 30, true).unwrap();

        assert_eq!(report.outcome, RotationOutcome::Completed);
        assert_eq!(report.turned(), 750);
        assert!(sim.is_holding());
        assert_eq!(
            commands(&sim),
            vec![
                SimEvent::SetSpeed(525.0),
                SimEvent::Rotate { degrees: 750, immediate_return: false }
            ]
        );
    }

    #[test]
    fn test_rotation_with_coast_floats() {
        let (mut m, sim, _) = motor();

        m.motor_on_for_degrees(50.0, 90, false).unwrap();

        assert!(!sim.is_holding());
        assert_eq!(sim.events().last(), Some(&SimEvent::Stop { brake: false }));
    }

    #[test]
    fn test_negative_power_direction() {
        let (mut m, sim, _) = motor();

        // Positive distance is turned backwards
        m.motor_on_for_degrees(-50.0, 90, true).unwrap();
        assert_eq!(sim.position(), -90);

        // Negative distance is not flipped a second time
        m.motor_on_for_degrees(-50.0, -90, true).unwrap();
        assert_eq!(sim.position(), -180);

        // Negative distance with positive power still goes backwards
        m.motor_on_for_degrees(50.0, -90, true).unwrap();
        assert_eq!(sim.position(), -270);
    }

    #[test]
    fn test_zero_rotation_is_no_op() {
        let (mut m, sim, _) = motor();

        let report = m.motor_on_for_rotations_degrees(80.0, 0.0, 0, false).unwrap();

        assert_eq!(report, RotationReport::no_op());
        assert!(commands(&sim).is_empty());
    }

    #[test]
    fn test_motor_on_zero_power_does_not_start() {
        let (mut m, sim, _) = motor();

        m.motor_on(0.0).unwrap();
        assert_eq!(sim.running(), None);

        m.motor_on(-20.0).unwrap();
        assert_eq!(sim.running(), Some(Direction::Backward));
        assert_eq!(m.target_power().unwrap(), 20.0);
    }

    #[test]
    fn test_power_clamped_to_max_speed() {
        let (mut m, sim, _) = motor();

        m.motor_on(180.0).unwrap();

        assert_eq!(commands(&sim)[0], SimEvent::SetSpeed(1050.0));
        assert_eq!(m.target_power().unwrap(), 100.0);
    }

    #[test]
    fn test_large_rotation_from_moved_position() {
        let (mut m, sim, _) = motor();

        m.motor_on_for_degrees(50.0, 45, true).unwrap();
        let report = m.motor_on_for_degrees(50.0, i32::MAX, true).unwrap();

        assert_eq!(report.start_position, 45);
        assert_eq!(report.target_position, i32::MAX);
        assert_eq!(sim.position(), i32::MAX);

        let report = m.motor_on_for_rotations(-50.0, 1.0e7, true).unwrap();
        assert_eq!(report.start_position, i32::MAX);
        assert_eq!(report.target_position, 0);
        assert_eq!(report.end_position, 0);
    }

    #[test]
    fn test_on_for_seconds() {
        let (mut m, sim, clock) = motor();

        m.motor_on_for_seconds(40.0, 0.25, true).unwrap();

        assert_eq!(clock.now(), Duration::from_millis(250));
        assert!(sim.is_holding());
        assert_eq!(sim.running(), None);
    }

    #[test]
    fn test_measure_current_power() {
        let (mut m, sim, clock) = motor();

        assert_eq!(m.measure_current_power().unwrap(), 0.0);
        assert_eq!(clock.now(), POWER_SAMPLE_WINDOW);

        // 21 degrees per window is 210 deg/s, a fifth of the maximum speed
        sim.set_deg_per_sample(Some(21));
        m.motor_on(20.0).unwrap();
        assert_eq!(m.measure_current_power().unwrap(), 20.0);
    }

    #[test]
    fn test_split_rotation() {
        let (mut m, sim, _) = motor();

        m.start_rotation(100.0, -45).unwrap();
        m.finish_rotation(false).unwrap();

        assert_eq!(sim.position(), -45);
        assert_eq!(
            commands(&sim),
            vec![
                SimEvent::SetSpeed(1050.0),
                SimEvent::Rotate { degrees: -45, immediate_return: true },
                SimEvent::WaitComplete,
                SimEvent::Stop { brake: false }
            ]
        );
    }

    #[test]
    fn test_close_then_unavailable() {
        let (mut m, sim, _) = motor();

        m.close().unwrap();

        assert!(sim.is_closed());
        assert!(matches!(
            m.rotation_reset(),
            Err(MotorError::ActuatorUnavailable { .. })
        ));

        drop(m);
        assert_eq!(sim.count(|e| *e == SimEvent::Close), 1);
    }
}
