//! # Block script interpreter module
//!
//! This module provides an interpreter for block scripts, allowing a sequence of block commands to
//! be executed from a file.
//!
//! Each command in a script is a label followed by the JSON of a [`BlockCmd`], terminated by a
//! semicolon. Lines starting with `#` are comments:
//!
//! ```text
//! # Drive forward then turn right
//! fwd: {"MoveSteering": {"steering": 0, "power": 50, "mode": {"OnForSeconds": {"seconds": 2, "brake": true}}}};
//! turn: {"MoveSteering": {"steering": 50, "power": 50, "mode": {"OnForDegrees": {"degrees": 360, "brake": true}}}};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use log::trace;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use crate::block_cmd::BlockCmd;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Matches `label: payload;` at the start of a line.
const CMD_PATTERN: &str = r"^\s*([A-Za-z0-9_\-]+)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A labelled command read from a script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedCmd {
    /// The label given to the command in the script
    pub label: String,

    /// The command to run
    pub cmd: BlockCmd
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.next_cmd` to acquire the commands
/// in the order they appear.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    cmds: VecDeque<ScriptedCmd>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),

    #[error("Script contains an invalid command at \"{0}\": {1}")]
    InvalidCmd(String, serde_json::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script_str(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of commands
        let mut cmds: VecDeque<ScriptedCmd> = VecDeque::new();

        let re = RegexBuilder::new(CMD_PATTERN)
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        for cap in re.captures_iter(script) {
            let label = cap.get(1).map_or("", |m| m.as_str()).to_string();
            let payload = cap.get(2).map_or("", |m| m.as_str());

            // The scripts contain JSON only.
            let cmd = BlockCmd::from_json(payload)
                .map_err(|e| ScriptError::InvalidCmd(label.clone(), e))?;

            trace!("Script command {}: {:?}", label, cmd);

            cmds.push_back(ScriptedCmd { label, cmd });
        }

        if cmds.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds
        })
    }

    /// Take the next command from the script, or `None` at the end of the script.
    pub fn next_cmd(&mut self) -> Option<ScriptedCmd> {
        self.cmds.pop_front()
    }

    /// Get the number of commands left in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Path the script was loaded from, if it came from a file.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

impl Iterator for ScriptInterpreter {
    type Item = ScriptedCmd;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_cmd()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
