//! # Move control module
//!
//! Two motor drive blocks. [`DualMotorDriver`] owns the left and right regulated motors of a
//! differential drive robot, and is commanded through one of two strategies:
//!
//! - [`MoveSteering`] - a single power and a steering amount, mixed into left and right powers by
//!   [`calc_steering`].
//! - [`MoveTank`] - independent left and right powers, see [`calc_tank`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod blocks;
mod cmd;
mod state;
mod calc_steering;
mod calc_tank;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use blocks::*;
pub use cmd::*;
pub use state::*;
pub use calc_steering::calc_steering;
pub use calc_tank::calc_tank;

use crate::motor::MotorError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MoveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MoveCtrlError {
    #[error("Left drive motor error: {0}")]
    Left(#[source] MotorError),

    #[error("Right drive motor error: {0}")]
    Right(#[source] MotorError),
}
