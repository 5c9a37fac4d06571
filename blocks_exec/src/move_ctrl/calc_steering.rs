//! Steering mixer calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::trace;

// Internal imports
use super::{MotorPowerPair, SteeringCommand};
use util::maths::clamp_percent;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Steering at which the inner wheel stops.
const STEERING_HALF_RANGE: f32 = 50.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Mix a steering and power demand into left and right motor powers.
///
/// Both inputs are clamped to [-100, 100] first. The outer wheel always runs at `power`, the
/// inner wheel is slowed linearly, stops at a steering of 50 and runs in reverse beyond that.
pub fn calc_steering(cmd: &SteeringCommand) -> MotorPowerPair {
    let steering = clamp_percent(cmd.steering);
    let power = clamp_percent(cmd.power);

    let mut pair = MotorPowerPair::new(power, power);

    if steering > 0.0 {
        // Right turn
        pair.right = power * (1.0 - steering / STEERING_HALF_RANGE);
    }
    else if steering < 0.0 {
        // Left turn
        pair.left = power * (1.0 + steering / STEERING_HALF_RANGE);
    }

    trace!(
        "steering: {}, power: {} -> left: {}, right: {}",
        steering, power, pair.left, pair.right
    );

    pair
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mix(steering: f32, power: f32) -> MotorPowerPair {
        calc_steering(&SteeringCommand::new(steering, power))
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(mix(0.0, 75.0), MotorPowerPair::new(75.0, 75.0));
        assert_eq!(mix(50.0, 80.0), MotorPowerPair::new(80.0, 0.0));
        assert_eq!(mix(100.0, 80.0), MotorPowerPair::new(80.0, -80.0));
        assert_eq!(mix(-25.0, 60.0), MotorPowerPair::new(30.0, 60.0));
        assert_eq!(mix(-100.0, -40.0), MotorPowerPair::new(40.0, -40.0));
    }

    #[test]
    fn test_outputs_bounded_by_power() {
        let mut s = -200.0;
        while s <= 200.0 {
            let mut p = -200.0;
            while p <= 200.0 {
                let out = mix(s, p);
                let limit = clamp_percent(p).abs();
                assert!(out.left.abs() <= limit, "left exceeds power for ({}, {})", s, p);
                assert!(out.right.abs() <= limit, "right exceeds power for ({}, {})", s, p);
                p += 12.5;
            }
            s += 12.5;
        }
    }

    #[test]
    fn test_straight_and_pivot_over_power_range() {
        let mut p = -200.0;
        while p <= 200.0 {
            let power = clamp_percent(p);
            assert_eq!(mix(0.0, p), MotorPowerPair::new(power, power), "straight at {}", p);
            assert_eq!(mix(100.0, p), MotorPowerPair::new(power, -power), "pivot right at {}", p);
            assert_eq!(mix(-100.0, p), MotorPowerPair::new(-power, power), "pivot left at {}", p);
            p += 12.5;
        }
    }

    #[test]
    fn test_mirror_symmetry() {
        for &(s, p) in &[(10.0, 50.0), (50.0, -80.0), (75.0, 100.0), (100.0, 33.0), (3.5, 7.0)] {
            assert_eq!(mix(-s, p), mix(s, p).swap());
        }
    }

    #[test]
    fn test_clamping_idempotent() {
        for &(s, p) in &[(150.0, 80.0), (-300.0, 120.0), (20.0, -101.0), (99.0, 99.0)] {
            assert_eq!(mix(s, p), mix(clamp_percent(s), clamp_percent(p)));
        }
        assert_eq!(mix(250.0, 500.0), MotorPowerPair::new(100.0, -100.0));
    }
}
