//! Implementations for the RotationCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Duration;
use log::{debug, trace, warn};

// Internal
use super::{
    AbortSignal, Params, RotationOutcome, RotationReport, RotationTarget, StallTracker,
    total_degrees
};
use crate::actuator::{Actuator, ActuatorError, Direction};
use util::maths::clamp_percent;
use util::time::Clock;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rotation control module state.
///
/// Holds only the parameters, everything describing a single command lives
/// on the stack of [`RotationCtrl::run`].
#[derive(Debug, Clone, Default)]
pub struct RotationCtrl {
    pub(crate) params: Params
}

/// A bounded rotation command for an unregulated motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCmd {
    /// Power percentage, negative runs backwards.
    pub power: f32,

    /// Number of full rotations, fractions are rounded to the nearest degree.
    pub rotations: f32,

    /// Additional degrees.
    pub degrees: i32,

    /// Hold the motor once stopped instead of coasting.
    pub brake: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RotationCmd {

    /// Whether the command asks for any movement at all. Only positive
    /// rotations or degrees count, the direction comes from the power.
    pub fn is_movement(&self) -> bool {
        self.rotations > 0.0 || self.degrees > 0
    }
}

impl RotationCtrl {

    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Execute a bounded rotation, blocking until the motor reaches the
    /// target, stalls, or `abort` is raised. Power is clamped to
    /// [-100, 100]. Once started the motor is always stopped, even if a
    /// tachometer read fails.
    pub fn run<A, C, S>(
        &self,
        actuator: &mut A,
        clock: &C,
        abort: &S,
        cmd: &RotationCmd
    ) -> Result<RotationReport, ActuatorError>
    where
        A: Actuator + ?Sized,
        C: Clock + ?Sized,
        S: AbortSignal + ?Sized
    {
        if !cmd.is_movement() {
            trace!("Rotation on {} ignored, nothing to turn", actuator.port_name());
            return Ok(RotationReport::no_op())
        }

        let direction = Direction::from_power(cmd.power);
        let target_delta = total_degrees(cmd.rotations, cmd.degrees);

        actuator.set_power(clamp_percent(cmd.power).abs())?;

        // Capture the start of the move
        let start_position = actuator.position()?;
        let start_time = clock.now();
        let target = RotationTarget::new(start_position, target_delta, direction);

        debug!(
            "Rotating {} by {} deg ({:?}): {} -> {}",
            actuator.port_name(),
            target_delta,
            direction,
            start_position,
            target.target_position
        );

        actuator.start(direction)?;

        let polled = self.poll(actuator, clock, abort, &target, start_time);
        let stopped = actuator.stop(cmd.brake);

        let (outcome, end_position, samples) = match polled {
            Ok(p) => p,
            Err(e) => {
                if let Err(stop_err) = stopped {
                    warn!(
                        "Could not stop {} after a failed rotation: {}",
                        actuator.port_name(),
                        stop_err
                    );
                }
                return Err(e)
            }
        };
        stopped?;

        let report = RotationReport {
            outcome,
            start_position,
            target_position: target.target_position,
            end_position,
            samples,
            elapsed: clock.now().checked_sub(start_time).unwrap_or_default()
        };

        debug!(
            "Rotation on {} ended {:?} at {} after {} samples",
            actuator.port_name(),
            report.outcome,
            report.end_position,
            report.samples
        );

        Ok(report)
    }

    /// Sample the tachometer until the rotation ends, returning the outcome,
    /// the last position read and the number of samples taken.
    fn poll<A, C, S>(
        &self,
        actuator: &mut A,
        clock: &C,
        abort: &S,
        target: &RotationTarget,
        start_time: Duration
    ) -> Result<(RotationOutcome, i32, u64), ActuatorError>
    where
        A: Actuator + ?Sized,
        C: Clock + ?Sized,
        S: AbortSignal + ?Sized
    {
        let mut tracker = StallTracker::new(target.start_position, start_time);
        let mut samples = 0u64;
        let mut current = target.start_position;

        let outcome = loop {
            if abort.is_aborted() {
                break RotationOutcome::Cancelled
            }

            current = actuator.position()?;
            let now = clock.now();
            samples += 1;

            let pending = target.pending(current);

            trace!("pos: {}, pending: {}", current, pending);

            if pending <= 0 {
                break RotationOutcome::Completed
            }

            if tracker.observe(current, now) >= self.params.stall_timeout() {
                break RotationOutcome::Blocked
            }

            // Close to the target only yield, so the stop isn't late by a
            // whole sample interval
            if pending < self.params.fine_approach_deg {
                clock.yield_now();
            }
            else {
                clock.sleep(self.params.sample_interval());
            }
        };

        Ok((outcome, current, samples))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use crate::actuator::sim::{SimEvent, SimHandle, SimMotor};
    use crate::rotation_ctrl::NeverAbort;
    use util::time::SimClock;

    /// Raises the abort after a number of checks.
    struct AbortAfter(Cell<u32>);

    impl AbortSignal for AbortAfter {
        fn is_aborted(&self) -> bool {
            let left = self.0.get();
            if left == 0 {
                return true
            }
            self.0.set(left - 1);
            false
        }
    }

    /// Blocks the motor once it reaches a position.
    struct BlockAt(SimHandle, i32);

    impl AbortSignal for BlockAt {
        fn is_aborted(&self) -> bool {
            if self.0.position() >= self.1 {
                self.0.set_stalled(true);
            }
            false
        }
    }

    /// Simulated motor whose tachometer stops responding after a number of
    /// reads.
    struct FailingTacho {
        inner: SimMotor,
        reads_left: u32
    }

    impl Actuator for FailingTacho {
        fn port_name(&self) -> &str {
            self.inner.port_name()
        }

        fn start(&mut self, direction: Direction) -> Result<(), ActuatorError> {
            self.inner.start(direction)
        }

        fn set_power(&mut self, level: f32) -> Result<(), ActuatorError> {
            self.inner.set_power(level)
        }

        fn stop(&mut self, brake: bool) -> Result<(), ActuatorError> {
            self.inner.stop(brake)
        }

        fn position(&mut self) -> Result<i32, ActuatorError> {
            if self.reads_left == 0 {
                return Err(ActuatorError::NotConnected(self.inner.port_name().to_string()))
            }
            self.reads_left -= 1;
            self.inner.position()
        }

        fn reset_position(&mut self) -> Result<(), ActuatorError> {
            self.inner.reset_position()
        }

        fn close(&mut self) -> Result<(), ActuatorError> {
            self.inner.close()
        }
    }

    fn cmd(power: f32, rotations: f32, degrees: i32, brake: bool) -> RotationCmd {
        RotationCmd { power, rotations, degrees, brake }
    }

    #[test]
    fn test_reaches_target() {
        let mut motor = SimMotor::new("A");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(7));

        let ctrl = RotationCtrl::default();
        let clock = SimClock::new();

        let report = ctrl
            .run(&mut motor, &clock, &NeverAbort, &cmd(50.0, 2.0, 30, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Completed);
        assert_eq!(report.target_position, 750);
        assert!(report.end_position >= report.start_position + 750);
        assert!(report.end_position < 750 + 7);
        assert_eq!(sim.running(), None);
        assert!(sim.is_holding());
    }

    #[test]
    fn test_backward_with_coast() {
        let mut motor = SimMotor::new("A");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(5));

        let report = RotationCtrl::default()
            .run(&mut motor, &SimClock::new(), &NeverAbort, &cmd(-40.0, 0.0, 90, false))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Completed);
        assert_eq!(report.target_position, -90);
        assert!(report.end_position <= -90);
        assert_eq!(
            sim.events(),
            vec![
                SimEvent::SetPower(40.0),
                SimEvent::Start(Direction::Backward),
                SimEvent::Stop { brake: false }
            ]
        );
    }

    #[test]
    fn test_no_op_commands() {
        let mut motor = SimMotor::new("A");
        let sim = motor.handle();
        let ctrl = RotationCtrl::default();
        let clock = SimClock::new();

        for c in &[cmd(50.0, 0.0, 0, true), cmd(50.0, -1.0, 0, true), cmd(50.0, 0.0, -90, true)] {
            let report = ctrl.run(&mut motor, &clock, &NeverAbort, c).unwrap();
            assert_eq!(report, RotationReport::no_op());
        }

        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_stall_ends_within_timeout() {
        let mut motor = SimMotor::new("B");
        let sim = motor.handle();
        sim.set_stalled(true);

        let params = Params::default();
        let ctrl = RotationCtrl::new(params.clone());
        let clock = SimClock::new();

        let report = ctrl
            .run(&mut motor, &clock, &NeverAbort, &cmd(80.0, 100.0, 0, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Blocked);
        assert!(report.elapsed >= params.stall_timeout());
        assert!(report.elapsed <= params.stall_timeout() + params.sample_interval());
        assert_eq!(report.turned(), 0);
        assert_eq!(sim.running(), None);
    }

    #[test]
    fn test_stall_after_some_movement() {
        let mut motor = SimMotor::new("B");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(2));

        let clock = SimClock::new();
        let report = RotationCtrl::default()
            .run(&mut motor, &clock, &BlockAt(sim.clone(), 40), &cmd(30.0, 1.0, 0, false))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Blocked);
        assert_eq!(report.end_position, 40);
    }

    #[test]
    fn test_cancel_mid_loop() {
        let mut motor = SimMotor::new("C");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(1));

        let clock = SimClock::new();
        let abort = AbortAfter(Cell::new(25));

        let report = RotationCtrl::default()
            .run(&mut motor, &clock, &abort, &cmd(60.0, 10.0, 0, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Cancelled);
        assert_eq!(report.samples, 25);
        assert!(report.elapsed <= Duration::from_millis(25));
        assert_eq!(sim.running(), None);
        assert!(sim.is_holding());
    }

    #[test]
    fn test_cancel_before_start_of_loop() {
        let mut motor = SimMotor::new("D");
        let sim = motor.handle();

        let raised = AtomicBool::new(true);

        let report = RotationCtrl::default()
            .run(&mut motor, &SimClock::new(), &raised, &cmd(60.0, 1.0, 0, false))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Cancelled);
        assert_eq!(report.samples, 0);
        assert_eq!(sim.count(|e| *e == SimEvent::Stop { brake: false }), 1);
    }

    #[test]
    fn test_stall_on_small_target() {
        let mut motor = SimMotor::new("B");
        let sim = motor.handle();
        sim.set_stalled(true);

        let params = Params::default();
        let report = RotationCtrl::new(params.clone())
            .run(&mut motor, &SimClock::new(), &NeverAbort, &cmd(50.0, 0.0, 5, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Blocked);
        assert!(report.elapsed >= params.stall_timeout());
        assert!(report.elapsed <= params.stall_timeout() + params.sample_interval());
        assert_eq!(sim.running(), None);
    }

    #[test]
    fn test_stall_close_to_target() {
        let mut motor = SimMotor::new("B");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(5));

        let params = Params::default();
        let report = RotationCtrl::new(params.clone())
            .run(&mut motor, &SimClock::new(), &BlockAt(sim.clone(), 355), &cmd(50.0, 1.0, 0, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Blocked);
        assert_eq!(report.end_position, 355);
        assert_eq!(sim.running(), None);
    }

    #[test]
    fn test_large_target_from_moved_position() {
        let mut motor = SimMotor::new("E");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(5));

        let ctrl = RotationCtrl::default();
        let clock = SimClock::new();

        ctrl.run(&mut motor, &clock, &NeverAbort, &cmd(50.0, 0.0, 5, true)).unwrap();
        let start = sim.position();
        assert!(start > 0);

        let report = ctrl
            .run(&mut motor, &clock, &AbortAfter(Cell::new(10)), &cmd(50.0, 0.0, i32::MAX, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Cancelled);
        assert_eq!(report.start_position, start);
        assert_eq!(report.target_position, i32::MAX);
        assert_eq!(report.turned(), 50);

        let report = ctrl
            .run(&mut motor, &clock, &AbortAfter(Cell::new(10)), &cmd(50.0, 1.0e7, 0, true))
            .unwrap();

        assert_eq!(report.outcome, RotationOutcome::Cancelled);
        assert_eq!(report.target_position, i32::MAX);
    }

    #[test]
    fn test_tacho_failure_stops_motor() {
        let inner = SimMotor::new("F");
        let sim = inner.handle();
        sim.set_deg_per_sample(Some(1));
        let mut motor = FailingTacho { inner, reads_left: 3 };

        let result = RotationCtrl::default()
            .run(&mut motor, &SimClock::new(), &NeverAbort, &cmd(60.0, 1.0, 0, true));

        assert!(matches!(result, Err(ActuatorError::NotConnected(_))));
        assert_eq!(sim.running(), None);
        assert_eq!(sim.count(|e| *e == SimEvent::Stop { brake: true }), 1);
    }

    #[test]
    fn test_power_clamped() {
        let mut motor = SimMotor::new("G");
        let sim = motor.handle();
        sim.set_deg_per_sample(Some(10));

        RotationCtrl::default()
            .run(&mut motor, &SimClock::new(), &NeverAbort, &cmd(-150.0, 0.0, 90, true))
            .unwrap();

        assert_eq!(sim.events()[0], SimEvent::SetPower(100.0));
        assert_eq!(sim.events()[1], SimEvent::Start(Direction::Backward));
    }
}
