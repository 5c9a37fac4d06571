//! # Blocks Executable Parameters
//!
//! This module provide parameters for the blocks executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::actuator::sim::SimConfig;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct BlocksExecParams {

    /// Port of the left drive motor
    pub left_port: String,

    /// Port of the right drive motor
    pub right_port: String,

    /// Port of the auxiliary unregulated motor
    pub aux_port: String,

    /// Simulation of the drive motors
    #[serde(default)]
    pub drive_sim: SimConfig,

    /// Simulation of the auxiliary motor
    #[serde(default)]
    pub aux_sim: SimConfig
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_params() {
        let p: BlocksExecParams = util::params::from_toml_str(r#"
            left_port = "B"
            right_port = "C"
            aux_port = "A"

            [aux_sim]
            deg_per_sample = 4
        "#).unwrap();

        assert_eq!(p.left_port, "B");
        assert_eq!(p.aux_sim.deg_per_sample, Some(4));
        assert_eq!(p.drive_sim.deg_per_sample, None);
        assert_eq!(p.drive_sim.max_speed_degs, crate::actuator::sim::DEFAULT_MAX_SPEED_DEGS);
    }
}
