//! Move Steering and Move Tank blocks

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{DualMotorDriver, DualRotationReport, MoveCtrlError, SteeringCommand, TankCommand};
use crate::actuator::RegulatedActuator;
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Move Steering block, borrowing a [`DualMotorDriver`] for the duration of a command.
///
/// `steering` and `power` are percentages, see [`SteeringCommand`].
pub struct MoveSteering<'a, A: RegulatedActuator, C: Clock> {
    driver: &'a mut DualMotorDriver<A, C>
}

/// Move Tank block, borrowing a [`DualMotorDriver`] for the duration of a command.
pub struct MoveTank<'a, A: RegulatedActuator, C: Clock> {
    driver: &'a mut DualMotorDriver<A, C>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a, A: RegulatedActuator, C: Clock> MoveSteering<'a, A, C> {

    pub fn new(driver: &'a mut DualMotorDriver<A, C>) -> Self {
        Self { driver }
    }

    /// Start both motors and return immediately.
    pub fn motors_on(&mut self, steering: f32, power: f32) -> Result<(), MoveCtrlError> {
        self.driver.on(SteeringCommand::new(steering, power).resolve())
    }

    /// Run both motors for `seconds`. Does nothing unless `seconds` is positive.
    pub fn motors_on_for_seconds(
        &mut self,
        steering: f32,
        power: f32,
        seconds: f32,
        brake: bool
    ) -> Result<(), MoveCtrlError> {
        self.driver.on_for_seconds(SteeringCommand::new(steering, power).resolve(), seconds, brake)
    }

    /// Run both motors for `rotations * 360 + degrees` of the faster side.
    pub fn motors_on_for_rotations_degrees(
        &mut self,
        steering: f32,
        power: f32,
        rotations: f32,
        degrees: i32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.driver.on_for_rotations_degrees(
            SteeringCommand::new(steering, power).resolve(),
            rotations,
            degrees,
            brake
        )
    }

    pub fn motors_on_for_rotations(
        &mut self,
        steering: f32,
        power: f32,
        rotations: f32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.motors_on_for_rotations_degrees(steering, power, rotations, 0, brake)
    }

    pub fn motors_on_for_degrees(
        &mut self,
        steering: f32,
        power: f32,
        degrees: i32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.motors_on_for_rotations_degrees(steering, power, 0.0, degrees, brake)
    }

    pub fn motors_off(&mut self, brake: bool) -> Result<(), MoveCtrlError> {
        self.driver.off(brake)
    }
}

impl<'a, A: RegulatedActuator, C: Clock> MoveTank<'a, A, C> {

    pub fn new(driver: &'a mut DualMotorDriver<A, C>) -> Self {
        Self { driver }
    }

    /// Start both motors and return immediately.
    pub fn motors_on(&mut self, left: f32, right: f32) -> Result<(), MoveCtrlError> {
        self.driver.on(TankCommand::new(left, right).resolve())
    }

    /// Run both motors for `seconds`. Does nothing unless `seconds` is positive.
    pub fn motors_on_for_seconds(
        &mut self,
        left: f32,
        right: f32,
        seconds: f32,
        brake: bool
    ) -> Result<(), MoveCtrlError> {
        self.driver.on_for_seconds(TankCommand::new(left, right).resolve(), seconds, brake)
    }

    /// Run both motors for `rotations * 360 + degrees` of the faster side.
    pub fn motors_on_for_rotations_degrees(
        &mut self,
        left: f32,
        right: f32,
        rotations: f32,
        degrees: i32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.driver.on_for_rotations_degrees(
            TankCommand::new(left, right).resolve(),
            rotations,
            degrees,
            brake
        )
    }

    pub fn motors_on_for_rotations(
        &mut self,
        left: f32,
        right: f32,
        rotations: f32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.motors_on_for_rotations_degrees(left, right, rotations, 0, brake)
    }

    pub fn motors_on_for_degrees(
        &mut self,
        left: f32,
        right: f32,
        degrees: i32,
        brake: bool
    ) -> Result<DualRotationReport, MoveCtrlError> {
        self.motors_on_for_rotations_degrees(left, right, 0.0, degrees, brake)
    }

    pub fn motors_off(&mut self, brake: bool) -> Result<(), MoveCtrlError> {
        self.driver.off(brake)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{sim::{SimEvent, SimHandle, SimMotor}, Direction};
    use util::time::SimClock;

    fn driver() -> (DualMotorDriver<SimMotor, SimClock>, SimHandle, SimHandle) {
        let left = SimMotor::new("B");
        let right = SimMotor::new("C");
        let (lh, rh) = (left.handle(), right.handle());

        let d = DualMotorDriver::from_actuators(left, right, SimClock::new()).unwrap();
        (d, lh, rh)
    }

    #[test]
    fn test_steering_inner_wheel_stops() {
        let (mut d, lh, rh) = driver();

        d.steering().motors_on(50.0, 80.0).unwrap();

        assert_eq!(lh.running(), Some(Direction::Forward));
        assert_eq!(lh.power(), 80.0);
        assert_eq!(rh.running(), None);
    }

    #[test]
    fn test_steering_spin_rotation() {
        let (mut d, lh, rh) = driver();

        let report = d.steering().motors_on_for_degrees(100.0, 60.0, 180, true).unwrap();

        assert_eq!(report.left.turned(), 180);
        assert_eq!(report.right.turned(), -180);
        assert_eq!(lh.position(), 180);
        assert_eq!(rh.position(), -180);
    }

    #[test]
    fn test_steering_ignores_zero_period() {
        let (mut d, lh, _) = driver();

        d.steering().motors_on_for_seconds(0.0, 50.0, 0.0, true).unwrap();

        assert_eq!(lh.count(|e| matches!(e, SimEvent::Stop { .. })), 0);
    }

    #[test]
    fn test_tank_clamps_and_reverses() {
        let (mut d, lh, rh) = driver();

        d.tank().motors_on(150.0, -120.0).unwrap();

        assert_eq!(lh.running(), Some(Direction::Forward));
        assert_eq!(rh.running(), Some(Direction::Backward));
        assert_eq!(lh.power(), 100.0);
        assert_eq!(rh.power(), 100.0);

        d.tank().motors_off(true).unwrap();
        assert!(lh.is_holding() && rh.is_holding());
    }

    #[test]
    fn test_tank_rotations() {
        let (mut d, lh, rh) = driver();

        d.tank().motors_on_for_rotations(-25.0, -50.0, 2.0, false).unwrap();

        assert_eq!(lh.position(), -360);
        assert_eq!(rh.position(), -720);
    }
}
