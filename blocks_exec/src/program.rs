//! # Block programs
//!
//! A [`Program`] runs the commands of a [`ScriptInterpreter`] one after another against a
//! [`Robot`]: a differential drive plus one auxiliary unregulated motor. Each command blocks until
//! it is complete, exactly as the blocks would in a graphical program.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{debug, info, warn};
use serde::Serialize;

use crate::actuator::{Actuator, RegulatedActuator};
use crate::block_cmd::{BlockCmd, DriveMode, MotorSelect};
use crate::motor::{wait_time, MotorBlock, MotorError, UnregulatedMotor};
use crate::move_ctrl::{DualMotorDriver, MoveCtrlError};
use crate::rotation_ctrl::{self, RotationOutcome};
use crate::script_interpreter::{ScriptInterpreter, ScriptedCmd};
use util::archive::{ArchiveError, Archived, Archiver};
use util::time::Clock;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The motors a program drives.
pub struct Robot<D: RegulatedActuator, U: Actuator, C: Clock> {
    pub drive: DualMotorDriver<D, C>,
    pub aux: UnregulatedMotor<U, C>,
    clock: C,
    abort: Arc<AtomicBool>
}

/// Runs a script of block commands.
pub struct Program {
    interpreter: ScriptInterpreter,

    last_step: Option<StepReport>,
    arch_steps: Option<Archiver>
}

/// Record of one executed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Position of the command in the script, from zero.
    pub index: usize,

    pub label: String,

    pub block: &'static str,

    pub mode: Option<&'static str>,

    /// Outcome of rotation bounded commands.
    pub outcome: Option<RotationOutcome>,

    /// Tachometer readings once the command had finished.
    ///
    /// Units: degrees
    pub left_deg: i32,
    pub right_deg: i32,
    pub aux_deg: i32,

    /// Time since the start of the program at which the command finished.
    ///
    /// Units: seconds
    pub time_s: f64
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("Drive error: {0}")]
    Drive(#[from] MoveCtrlError),

    #[error("Auxiliary motor error: {0}")]
    Motor(#[from] MotorError),

    #[error("Could not archive step: {0}")]
    Archive(#[from] ArchiveError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D: RegulatedActuator, U: Actuator, C: Clock + Clone> Robot<D, U, C> {

    /// Open the drive motors as large motors and the auxiliary motor as an unregulated motor.
    pub fn from_actuators(
        left: D,
        right: D,
        aux: U,
        clock: C,
        rotation_params: rotation_ctrl::Params
    ) -> Result<Self, ProgramError> {
        let drive = DualMotorDriver::from_actuators(left, right, clock.clone())?;
        let aux = UnregulatedMotor::new(aux, clock.clone(), rotation_params);

        Ok(Self::new(drive, aux, clock))
    }
}

impl<D: RegulatedActuator, U: Actuator, C: Clock> Robot<D, U, C> {

    pub fn new(drive: DualMotorDriver<D, C>, aux: UnregulatedMotor<U, C>, clock: C) -> Self {
        let abort = Arc::new(AtomicBool::new(false));

        Self {
            drive,
            aux: aux.with_abort(abort.clone()),
            clock,
            abort
        }
    }

    /// Flag which stops the program before its next command and ends any auxiliary motor
    /// rotation in progress.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Execute a single command, returning the outcome of rotation bounded commands.
    pub fn exec(&mut self, cmd: &BlockCmd) -> Result<Option<RotationOutcome>, ProgramError> {
        let outcome = match *cmd {
            BlockCmd::MoveSteering { steering, power, mode } => {
                let mut blk = self.drive.steering();

                match mode {
                    DriveMode::On => {
                        blk.motors_on(steering, power)?;
                        None
                    },
                    DriveMode::OnForSeconds { seconds, brake } => {
                        blk.motors_on_for_seconds(steering, power, seconds, brake)?;
                        None
                    },
                    DriveMode::OnForRotations { rotations, brake } => Some(
                        blk.motors_on_for_rotations(steering, power, rotations, brake)?.outcome()
                    ),
                    DriveMode::OnForDegrees { degrees, brake } => Some(
                        blk.motors_on_for_degrees(steering, power, degrees, brake)?.outcome()
                    ),
                    DriveMode::Off { brake } => {
                        blk.motors_off(brake)?;
                        None
                    }
                }
            },
            BlockCmd::MoveTank { left, right, mode } => {
                let mut blk = self.drive.tank();

                match mode {
                    DriveMode::On => {
                        blk.motors_on(left, right)?;
                        None
                    },
                    DriveMode::OnForSeconds { seconds, brake } => {
                        blk.motors_on_for_seconds(left, right, seconds, brake)?;
                        None
                    },
                    DriveMode::OnForRotations { rotations, brake } => Some(
                        blk.motors_on_for_rotations(left, right, rotations, brake)?.outcome()
                    ),
                    DriveMode::OnForDegrees { degrees, brake } => Some(
                        blk.motors_on_for_degrees(left, right, degrees, brake)?.outcome()
                    ),
                    DriveMode::Off { brake } => {
                        blk.motors_off(brake)?;
                        None
                    }
                }
            },
            BlockCmd::Motor { power, mode } => match mode {
                DriveMode::On => {
                    self.aux.motor_on(power)?;
                    None
                },
                DriveMode::OnForSeconds { seconds, brake } => {
                    self.aux.motor_on_for_seconds(power, seconds, brake)?;
                    None
                },
                DriveMode::OnForRotations { rotations, brake } => Some(
                    self.aux.motor_on_for_rotations(power, rotations, brake)?.outcome
                ),
                DriveMode::OnForDegrees { degrees, brake } => Some(
                    self.aux.motor_on_for_degrees(power, degrees, brake)?.outcome
                ),
                DriveMode::Off { brake } => {
                    self.aux.motor_off(brake)?;
                    None
                }
            },
            BlockCmd::MotorRotationReset { motor } => {
                match motor {
                    MotorSelect::Left => self.drive
                        .left_mut()
                        .rotation_reset()
                        .map_err(MoveCtrlError::Left)?,
                    MotorSelect::Right => self.drive
                        .right_mut()
                        .rotation_reset()
                        .map_err(MoveCtrlError::Right)?,
                    MotorSelect::Aux => self.aux.rotation_reset()?
                }
                None
            },
            BlockCmd::Wait { seconds } => {
                wait_time(&self.clock, seconds);
                None
            }
        };

        Ok(outcome)
    }

    /// Stop and release every motor.
    pub fn close(&mut self) -> Result<(), ProgramError> {
        let drive = self.drive.close();
        let aux = self.aux.close();
        drive?;
        aux?;
        Ok(())
    }
}

impl Program {

    pub fn new(interpreter: ScriptInterpreter) -> Self {
        Self {
            interpreter,
            last_step: None,
            arch_steps: None
        }
    }

    /// Archive a record of every step to `archiver`.
    pub fn with_archive(mut self, archiver: Archiver) -> Self {
        self.arch_steps = Some(archiver);
        self
    }

    /// Run the remaining commands of the script in order.
    ///
    /// Stops early, without error, if the robot's abort flag is raised. The first motor error
    /// ends the program.
    pub fn run<D, U, C>(&mut self, robot: &mut Robot<D, U, C>) -> Result<Vec<StepReport>, ProgramError>
    where
        D: RegulatedActuator,
        U: Actuator,
        C: Clock
    {
        let start_time = robot.clock.now();
        let mut steps = Vec::with_capacity(self.interpreter.get_num_cmds());
        let mut index = 0;

        while let Some(ScriptedCmd { label, cmd }) = self.interpreter.next_cmd() {
            if robot.is_aborted() {
                warn!("Program aborted before \"{}\"", label);
                break
            }

            info!("[{}] {}", label, cmd.block_name());
            debug!("{:?}", cmd);

            let outcome = robot.exec(&cmd)?;

            if let Some(o) = outcome {
                if o == RotationOutcome::Blocked || o == RotationOutcome::Cancelled {
                    warn!("[{}] rotation ended {:?}", label, o);
                }
            }

            let (left_deg, right_deg) = robot.drive.measure_degrees()?;
            let aux_deg = robot.aux.measure_degrees()?;

            let step = StepReport {
                index,
                label,
                block: cmd.block_name(),
                mode: cmd.mode().map(|m| m.name()),
                outcome,
                left_deg,
                right_deg,
                aux_deg,
                time_s: robot.clock.now()
                    .checked_sub(start_time)
                    .unwrap_or_default()
                    .as_secs_f64()
            };

            self.last_step = Some(step.clone());
            self.write()?;

            steps.push(step);
            index += 1;
        }

        info!("Program finished after {} steps", steps.len());

        Ok(steps)
    }
}

impl Archived for Program {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let (Some(arch), Some(step)) = (self.arch_steps.as_mut(), self.last_step.as_ref()) {
            arch.serialise(step)?;
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Emergency stop handler which raises `abort`, for use with a signal handler such as Ctrl-C.
///
/// The running auxiliary rotation is cancelled and the program ends before its next command, so
/// the motors can still be released normally.
pub fn estop_handler(abort: Arc<AtomicBool>) -> impl Fn() + Send + 'static {
    move || {
        warn!("Emergency stop requested");
        abort.store(true, Ordering::SeqCst);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
