//! # Block commands
//!
//! Commands that can be issued to the programming blocks, either from a script or directly. All
//! commands are serialised to JSON using serde's externally tagged representation, for example:
//!
//! ```json
//! {"MoveSteering": {"steering": -25, "power": 60, "mode": {"OnForRotations": {"rotations": 2, "brake": true}}}}
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command for one of the programming blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BlockCmd {
    /// Drive both drive motors from a steering amount and a single power.
    MoveSteering {
        steering: f32,
        power: f32,
        mode: DriveMode
    },

    /// Drive both drive motors with independent powers.
    MoveTank {
        left: f32,
        right: f32,
        mode: DriveMode
    },

    /// Drive the auxiliary (unregulated) motor.
    Motor {
        power: f32,
        mode: DriveMode
    },

    /// Reset the tachometer of one motor.
    MotorRotationReset {
        motor: MotorSelect
    },

    /// Block for a number of seconds.
    Wait {
        seconds: f32
    }
}

/// How long a drive command runs for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DriveMode {
    /// Start and return immediately.
    On,

    OnForSeconds {
        seconds: f32,
        brake: bool
    },

    OnForRotations {
        rotations: f32,
        brake: bool
    },

    OnForDegrees {
        degrees: i32,
        brake: bool
    },

    /// Stop.
    Off {
        brake: bool
    }
}

/// Selects one of the robot's motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorSelect {
    Left,
    Right,
    Aux
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BlockCmd {

    /// Parse a command from its JSON representation.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Name of the block the command is for.
    pub fn block_name(&self) -> &'static str {
        match self {
            BlockCmd::MoveSteering { .. } => "MoveSteering",
            BlockCmd::MoveTank { .. } => "MoveTank",
            BlockCmd::Motor { .. } => "Motor",
            BlockCmd::MotorRotationReset { .. } => "MotorRotationReset",
            BlockCmd::Wait { .. } => "Wait"
        }
    }

    /// The drive mode of the command, if it has one.
    pub fn mode(&self) -> Option<DriveMode> {
        match self {
            BlockCmd::MoveSteering { mode, .. }
            | BlockCmd::MoveTank { mode, .. }
            | BlockCmd::Motor { mode, .. } => Some(*mode),
            _ => None
        }
    }
}

impl DriveMode {
    pub fn name(&self) -> &'static str {
        match self {
            DriveMode::On => "On",
            DriveMode::OnForSeconds { .. } => "OnForSeconds",
            DriveMode::OnForRotations { .. } => "OnForRotations",
            DriveMode::OnForDegrees { .. } => "OnForDegrees",
            DriveMode::Off { .. } => "Off"
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
    fn test_parse_steering() {
        let cmd = BlockCmd::from_json(
            r#"{"MoveSteering": {"steering": -25, "power": 60,
                "mode": {"OnForRotations": {"rotations": 2, "brake": true}}}}"#
        ).unwrap();

        assert_eq!(
            cmd,
            BlockCmd::MoveSteering {
                steering: -25.0,
                power: 60.0,
                mode: DriveMode::OnForRotations { rotations: 2.0, brake: true }
            }
        );
        assert_eq!(cmd.block_name(), "MoveSteering");
        assert_eq!(cmd.mode().map(|m| m.name()), Some("OnForRotations"));
    }

    #[test]
    fn test_parse_unit_mode_and_reset() {
        assert_eq!(
            BlockCmd::from_json(r#"{"Motor": {"power": -30, "mode": "On"}}"#).unwrap(),
            BlockCmd::Motor { power: -30.0, mode: DriveMode::On }
        );
        assert_eq!(
            BlockCmd::from_json(r#"{"MotorRotationReset": {"motor": "Aux"}}"#).unwrap(),
            BlockCmd::MotorRotationReset { motor: MotorSelect::Aux }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_block() {
        assert!(BlockCmd::from_json(r#"{"Display": {"text": "hi"}}"#).is_err());
        assert!(BlockCmd::from_json(r#"{"Wait": {}}"#).is_err());
    }
}
