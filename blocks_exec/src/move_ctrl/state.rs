//! Implementations for the DualMotorDriver state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{MotorPowerPair, MoveCtrlError, MoveSteering, MoveTank};
use crate::actuator::RegulatedActuator;
use crate::motor::{wait_time, MotorBlock, MotorError, MotorKind, RegulatedMotor};
use crate::rotation_ctrl::{total_degrees, RotationOutcome, RotationReport};
use util::time::{Clock, SystemClock};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The left and right drive motors of a differential drive robot.
pub struct DualMotorDriver<A: RegulatedActuator, C: Clock = SystemClock> {
    left: RegulatedMotor<A, C>,
    right: RegulatedMotor<A, C>,
    clock: C
}

/// Result of a rotation bounded move, one report per side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DualRotationReport {
    pub left: RotationReport,
    pub right: RotationReport
}

/// Per side plan for a rotation bounded move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SidePlan {
    degrees: i32,
    start_position: i32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DualRotationReport {
    pub fn no_op() -> Self {
        Self {
            left: RotationReport::no_op(),
            right: RotationReport::no_op()
        }
    }

    /// Outcome of the move as a whole. Both sides always share an outcome.
    pub fn outcome(&self) -> RotationOutcome {
        self.left.outcome
    }
}

impl<A: RegulatedActuator, C: Clock + Clone> DualMotorDriver<A, C> {

    /// Open two large motors and drive them together.
    pub fn from_actuators(left: A, right: A, clock: C) -> Result<Self, MoveCtrlError> {
        let left = RegulatedMotor::new(MotorKind::Large, left, clock.clone())
            .map_err(MoveCtrlError::Left)?;
        let right = RegulatedMotor::new(MotorKind::Large, right, clock.clone())
            .map_err(MoveCtrlError::Right)?;

        Ok(Self::new(left, right, clock))
    }
}

impl<A: RegulatedActuator, C: Clock> DualMotorDriver<A, C> {

    pub fn new(left: RegulatedMotor<A, C>, right: RegulatedMotor<A, C>, clock: C) -> Self {
        debug!(
            "Dual motor driver on ports {} (left) and {} (right)",
            left.port_name(),
            right.port_name()
        );

        Self { left, right, clock }
    }

    /// Command the driver with a steering and power.
    pub fn steering(&mut self) -> MoveSteering<'_, A, C> {
        MoveSteering::new(self)
    }

    /// Command the driver with independent left and right powers.
    pub fn tank(&mut self) -> MoveTank<'_, A, C> {
        MoveTank::new(self)
    }

    pub fn left_mut(&mut self) -> &mut RegulatedMotor<A, C> {
        &mut self.left
    }

    pub fn right_mut(&mut self) -> &mut RegulatedMotor<A, C> {
        &mut self.right
    }

    /// Start both motors and return immediately.
    pub fn on(&mut self, powers: MotorPowerPair) -> Result<(), MoveCtrlError> {
        self.left.motor_on(powers.left).map_err(MoveCtrlError::Left)?;
        self.right.motor_on(powers.right).map_err(MoveCtrlError::Right)?;
        Ok(())
    }

    /// Run both motors for a number of seconds then stop them. Does nothing unless `seconds` is
    /// positive.
    pub fn on_for_seconds(
        &mut self,
        powers: MotorPowerPair,
        seconds: f32,
        brake: bool
    ) -> Result<(), MoveCtrlError> {
        if !(seconds > 0.0) {
            trace!("Dual move ignored, period {} sec", seconds);
            return Ok(())
        }

        self.on(powers)?;
        wait_time(&self.clock, seconds);
        self.off(brake)
    }

    /// Turn both motors by `rotations * 360 + degrees`, scaled per side so that both finish
    /// together. Does nothing unless `rotations` or `degrees` is positive.
    ///
    /// The side with the larger power magnitude turns the full distance, the other side turns a
    /// proportionally shorter distance. Negative power turns a side backwards.
    pub fn on_for_rotations_degrees(
        &mut self,
        powers: MotorPowerPair,
        rotations: f32,
        degrees: i32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        if !(rotations > 0.0 || degrees > 0) {
            trace!("Dual rotation ignored, nothing to turn");
            return Ok(DualRotationReport::no_op())
        }

        let max_power = powers.max_abs();
        if max_power == 0.0 {
            trace!("Dual rotation ignored, no power");
            return Ok(DualRotationReport::no_op())
        }

        let total = total_degrees(rotations, degrees);
        let start_time = self.clock.now();

        let left = SidePlan {
            degrees: side_degrees(total, powers.left, max_power),
            start_position: self.left.measure_degrees().map_err(MoveCtrlError::Left)?
        };
        let right = SidePlan {
            degrees: side_degrees(total, powers.right, max_power),
            start_position: self.right.measure_degrees().map_err(MoveCtrlError::Right)?
        };

        debug!(
            "Dual rotation {} deg: left {} deg, right {} deg",
            total, left.degrees, right.degrees
        );

        // Start both before waiting on either so they turn together
        self.left.start_rotation(powers.left, left.degrees).map_err(MoveCtrlError::Left)?;
        if let Err(e) = self.right.start_rotation(powers.right, right.degrees) {
            stop_after_failure(&mut self.left, brake);
            return Err(MoveCtrlError::Right(e))
        }

        let left_report = match finish_side(&mut self.left, &self.clock, left, start_time, brake) {
            Ok(r) => r,
            Err(e) => {
                stop_after_failure(&mut self.right, brake);
                return Err(MoveCtrlError::Left(e))
            }
        };
        let right_report = finish_side(&mut self.right, &self.clock, right, start_time, brake)
            .map_err(MoveCtrlError::Right)?;

        Ok(DualRotationReport {
            left: left_report,
            right: right_report
        })
    }

    /// Stop both motors.
    pub fn off(&mut self, brake: bool) -> Result<(), MoveCtrlError> {
        self.left.motor_off(brake).map_err(MoveCtrlError::Left)?;
        self.right.motor_off(brake).map_err(MoveCtrlError::Right)?;
        Ok(())
    }

    /// Tachometer readings of both motors, left then right.
    pub fn measure_degrees(&mut self) -> Result<(i32, i32), MoveCtrlError> {
        Ok((
            self.left.measure_degrees().map_err(MoveCtrlError::Left)?,
            self.right.measure_degrees().map_err(MoveCtrlError::Right)?
        ))
    }

    /// Release both motors. Both are attempted even if the first fails.
    pub fn close(&mut self) -> Result<(), MoveCtrlError> {
        let left = self.left.close().map_err(MoveCtrlError::Left);
        let right = self.right.close().map_err(MoveCtrlError::Right);
        left?;
        right?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Degrees one side should turn so it finishes with the side at `max_power`.
fn side_degrees(total: i32, power: f32, max_power: f32) -> i32 {
    let scaled = (total as f32 * power.abs() / max_power).round() as i32;

    if power < 0.0 && scaled > 0 {
        -scaled
    }
    else {
        scaled
    }
}

/// Stop one side because the other side failed. Errors are only logged, the
/// original failure is the one reported.
fn stop_after_failure<A, C>(motor: &mut RegulatedMotor<A, C>, brake: bool)
where
    A: RegulatedActuator,
    C: Clock
{
    if let Err(e) = motor.motor_off(brake) {
        warn!("Could not stop motor on port {}: {}", motor.port_name(), e);
    }
}

/// Wait for one side's rotation to complete, or just stop it if it had nothing to turn.
fn finish_side<A, C>(
    motor: &mut RegulatedMotor<A, C>,
    clock: &C,
    plan: SidePlan,
    start_time: std::time::Duration,
    brake: bool
) -> Result<RotationReport, MotorError>
where
    A: RegulatedActuator,
    C: Clock
{
    if plan.degrees == 0 {
        motor.motor_off(brake)?;
    }
    else {
        motor.finish_rotation(brake)?;
    }

    let end_position = motor.measure_degrees()?;

    Ok(RotationReport {
        outcome: RotationOutcome::Completed,
        start_position: plan.start_position,
        target_position: plan.start_position.saturating_add(plan.degrees),
        end_position,
        samples: 0,
        elapsed: clock.now().checked_sub(start_time).unwrap_or_default()
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::actuator::{sim::{SimEvent, SimHandle, SimMotor}, Direction};
    use util::time::SimClock;

    fn driver() -> (DualMotorDriver<SimMotor, SimClock>, SimHandle, SimHandle, SimClock) {
        let left = SimMotor::new("B");
        let right = SimMotor::new("C");
        let (lh, rh) = (left.handle(), right.handle());
        let clock = SimClock::new();

        let d = DualMotorDriver::from_actuators(left, right, clock.clone()).unwrap();
        (d, lh, rh, clock)
    }

    /// Events after the acceleration set when the motor was opened.
    fn commands(sim: &SimHandle) -> Vec<SimEvent> {
        sim.events().into_iter().skip(1).collect()
    }

    #[test]
    fn test_on_starts_both() {
        let (mut d, lh, rh, _) = driver();

        d.on(MotorPowerPair::new(80.0, -40.0)).unwrap();

        assert_eq!(lh.running(), Some(Direction::Forward));
        assert_eq!(rh.running(), Some(Direction::Backward));
        assert_eq!(commands(&lh)[0], SimEvent::SetSpeed(840.0));
        assert_eq!(commands(&rh)[0], SimEvent::SetSpeed(420.0));
    }

    #[test]
    fn test_on_for_seconds() {
        let (mut d, lh, rh, clock) = driver();

        d.on_for_seconds(MotorPowerPair::new(50.0, 50.0), 2.0, false).unwrap();

        assert_eq!(clock.now(), Duration::from_secs(2));
        assert_eq!(lh.events().last(), Some(&SimEvent::Stop { brake: false }));
        assert_eq!(rh.events().last(), Some(&SimEvent::Stop { brake: false }));
    }

    #[test]
    fn test_on_for_zero_seconds_is_no_op() {
        let (mut d, lh, rh, clock) = driver();

        d.on_for_seconds(MotorPowerPair::new(50.0, 50.0), 0.0, true).unwrap();
        d.on_for_seconds(MotorPowerPair::new(50.0, 50.0), -1.0, true).unwrap();

        assert_eq!(clock.now(), Duration::from_secs(0));
        assert!(commands(&lh).is_empty());
        assert!(commands(&rh).is_empty());
    }

    #[test]
    fn test_rotation_scales_slower_side() {
        let (mut d, lh, rh, _) = driver();

        let report = d
            .on_for_rotations_degrees(MotorPowerPair::new(80.0, 40.0), 1.0, 0, true)
            .unwrap();

        assert_eq!(report.left.turned(), 360);
        assert_eq!(report.right.turned(), 180);
        assert_eq!(lh.position(), 360);
        assert_eq!(rh.position(), 180);
        assert!(lh.is_holding() && rh.is_holding());

        // Both started before either was awaited
        assert_eq!(
            commands(&lh),
            vec![
                SimEvent::SetSpeed(840.0),
                SimEvent::Rotate { degrees: 360, immediate_return: true },
                SimEvent::WaitComplete
            ]
        );
    }

    #[test]
    fn test_spin_on_the_spot_with_coast() {
        let (mut d, lh, rh, _) = driver();

        d.on_for_rotations_degrees(MotorPowerPair::new(50.0, -50.0), 0.0, 90, false).unwrap();

        assert_eq!(lh.position(), 90);
        assert_eq!(rh.position(), -90);
        assert_eq!(lh.events().last(), Some(&SimEvent::Stop { brake: false }));
        assert_eq!(rh.events().last(), Some(&SimEvent::Stop { brake: false }));
    }

    #[test]
    fn test_rotation_with_stationary_side() {
        let (mut d, lh, rh, _) = driver();

        let report = d
            .on_for_rotations_degrees(MotorPowerPair::new(60.0, 0.0), 0.0, 90, true)
            .unwrap();

        assert_eq!(report.right.turned(), 0);
        assert_eq!(lh.position(), 90);
        assert_eq!(commands(&rh), vec![SimEvent::Stop { brake: true }]);
    }

    #[test]
    fn test_right_failure_stops_left() {
        let (mut d, lh, rh, _) = driver();
        rh.set_unplug_on_rotate(true);

        let result = d.on_for_rotations_degrees(MotorPowerPair::new(80.0, 40.0), 1.0, 0, true);

        assert!(matches!(result, Err(MoveCtrlError::Right(MotorError::Actuator(_)))));
        assert_eq!(lh.running(), None);
        assert_eq!(
            commands(&lh),
            vec![
                SimEvent::SetSpeed(840.0),
                SimEvent::Rotate { degrees: 360, immediate_return: true },
                SimEvent::Stop { brake: true }
            ]
        );
    }

    #[test]
    fn test_rotation_no_ops() {
        let (mut d, lh, rh, _) = driver();

        let none = d
            .on_for_rotations_degrees(MotorPowerPair::new(60.0, 60.0), 0.0, 0, true)
            .unwrap();
        let unpowered = d
            .on_for_rotations_degrees(MotorPowerPair::new(0.0, 0.0), 1.0, 0, true)
            .unwrap();

        assert_eq!(none, DualRotationReport::no_op());
        assert_eq!(unpowered, DualRotationReport::no_op());
        assert!(commands(&lh).is_empty());
        assert!(commands(&rh).is_empty());
    }

    #[test]
    fn test_close_releases_both() {
        let (mut d, lh, rh, _) = driver();

        d.close().unwrap();

        assert!(lh.is_closed() && rh.is_closed());
        assert!(matches!(
            d.off(true),
            Err(MoveCtrlError::Left(MotorError::ActuatorUnavailable { .. }))
        ));
    }

    #[test]
    fn test_side_degrees() {
        assert_eq!(side_degrees(360, 40.0, 80.0), 180);
        assert_eq!(side_degrees(360, -80.0, 80.0), -360);
        assert_eq!(side_degrees(100, 33.0, 100.0), 33);
        assert_eq!(side_degrees(360, 0.0, 80.0), 0);
    }
}
