//! # Blocks Executable
//!
//! Runs a script of EV3 programming block commands on a simulated robot with two large drive
//! motors and one unregulated auxiliary motor.
//!
//! ```text
//! blocks_exec [--params <file>] <script>
//! ```
//!
//! Every executed block is logged and archived to `arch/program/steps.csv` in the session
//! directory. Ctrl-C acts as an emergency stop: the program ends before its next block and the
//! motors are released.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::path::PathBuf;
use log::{info, warn};
use color_eyre::{Result, eyre::WrapErr};
use structopt::StructOpt;

// Internal
use blocks_lib::{
    actuator::sim::SimMotor,
    params::BlocksExecParams,
    program::{self, Program, Robot},
    rotation_ctrl::{self, RotationOutcome},
    script_interpreter::ScriptInterpreter,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::SystemClock,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "blocks_exec", about = "Run a block script on a simulated EV3 robot")]
struct Opt {
    /// Executable parameter file, relative to the params directory
    #[structopt(long, default_value = "blocks_exec.toml")]
    params: String,

    /// Rotation control parameter file, relative to the params directory
    #[structopt(long, default_value = "rotation_ctrl.toml")]
    rotation_params: String,

    /// The block script to run
    #[structopt(parse(from_os_str))]
    script: PathBuf,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "blocks_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("EV3 Blocks Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let params: BlocksExecParams = util::params::load(&opt.params)
        .wrap_err("Could not load exec params")?;
    let rotation_params: rotation_ctrl::Params = util::params::load(&opt.rotation_params)
        .wrap_err("Could not load rotation control params")?;

    info!("Parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", opt.script);

    let si = ScriptInterpreter::new(&opt.script)
        .wrap_err("Failed to load script")?;

    info!("Loaded script contains {} commands\n", si.get_num_cmds());

    // ---- INITIALISE ROBOT ----

    let mut robot = Robot::from_actuators(
        SimMotor::with_config(&params.left_port, &params.drive_sim),
        SimMotor::with_config(&params.right_port, &params.drive_sim),
        SimMotor::with_config(&params.aux_port, &params.aux_sim),
        SystemClock::new(),
        rotation_params
    ).wrap_err("Failed to initialise the robot")?;

    info!(
        "Robot initialised: drive on {} and {}, auxiliary on {}",
        params.left_port, params.right_port, params.aux_port
    );

    // Ctrl-C raises the emergency stop so the program ends and the motors are released below
    ctrlc::set_handler(program::estop_handler(robot.abort_flag()))
        .wrap_err("Failed to install the emergency stop handler")?;

    // ---- RUN PROGRAM ----

    session.arch_dir("program")
        .wrap_err("Failed to create the program archive directory")?;
    let archiver = Archiver::from_path(&session, "program/steps.csv")
        .wrap_err("Failed to open the step archive")?;

    let mut program = Program::new(si).with_archive(archiver);

    info!("Running program\n");

    let steps = program.run(&mut robot)
        .wrap_err("Program failed")?;

    let blocked = steps
        .iter()
        .filter(|s| s.outcome == Some(RotationOutcome::Blocked))
        .count();

    if blocked > 0 {
        warn!("{} rotations ended with the motor blocked", blocked);
    }

    if robot.is_aborted() {
        warn!("Program stopped by emergency stop after {} steps", steps.len());
    }

    if let Some(last) = steps.last() {
        info!(
            "Final positions: left {} deg, right {} deg, aux {} deg after {:.03} s",
            last.left_deg, last.right_deg, last.aux_deg, last.time_s
        );
    }

    // ---- SHUTDOWN ----

    robot.close().wrap_err("Failed to release the motors")?;

    session.exit();

    Ok(())
}
