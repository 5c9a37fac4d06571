//! # EV3 programming blocks library.
//!
//! This library implements the LEGO EV3 motor programming blocks on top of an abstract actuator
//! capability, and allows the `blocks_exec` executable to run scripts of block commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuator capability - the interface to (possibly simulated) motor hardware
pub mod actuator;

/// Block commands - serialisable commands for each block
pub mod block_cmd;

/// Motor blocks - regulated and unregulated single motors, motor rotation sensing
pub mod motor;

/// Move control - Move Steering and Move Tank on a pair of drive motors
pub mod move_ctrl;

/// Parameters for the blocks executable
pub mod params;

/// Block programs - runs scripted commands against a robot
pub mod program;

/// Rotation control - bounded rotations of unregulated motors by tachometer polling
pub mod rotation_ctrl;

/// Script interpreter - reads block commands from script files
pub mod script_interpreter;
