//! Tank drive calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{MotorPowerPair, TankCommand};
use util::maths::clamp_percent;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Tank drive passes each side straight through, limited to [-100, 100].
pub fn calc_tank(cmd: &TankCommand) -> MotorPowerPair {
    MotorPowerPair::new(clamp_percent(cmd.left), clamp_percent(cmd.right))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tank_clamps_each_side() {
        assert_eq!(
            calc_tank(&TankCommand::new(150.0, -120.0)),
            MotorPowerPair::new(100.0, -100.0)
        );
        assert_eq!(
            calc_tank(&TankCommand::new(-30.0, 45.5)),
            MotorPowerPair::new(-30.0, 45.5)
        );
    }
}
