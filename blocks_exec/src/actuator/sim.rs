//! Simulated motor actuator
//!
//! The simulated motor has a very simple motion model: every time the tachometer is read while the
//! motor is running, the position advances by a fixed number of degrees. This makes polling loops
//! deterministic regardless of how fast they sample. Regulated rotations complete instantly.
//!
//! The state of the motor is shared with a [`SimHandle`] so that it can still be inspected once
//! the actuator has been moved into a block.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};
use log::trace;
use serde::{Deserialize, Serialize};

use super::{Actuator, ActuatorError, Direction, RegulatedActuator};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default maximum speed of a simulated motor, roughly that of an EV3 large motor.
pub const DEFAULT_MAX_SPEED_DEGS: f32 = 1050.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration of a simulated motor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Maximum speed in degrees/second.
    pub max_speed_degs: f32,

    /// Degrees advanced per tachometer read while running. If `None` this is derived from the
    /// current power.
    pub deg_per_sample: Option<i32>,
}

/// A simulated motor implementing both actuator traits.
#[derive(Debug)]
pub struct SimMotor {
    port: String,
    state: Arc<Mutex<SimState>>
}

/// Shared view onto a [`SimMotor`]'s state.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>
}

#[derive(Debug)]
struct SimState {
    position: i32,
    running: Option<Direction>,
    power: f32,
    speed: f32,
    max_speed: f32,
    acceleration: u32,
    holding: bool,
    stalled: bool,
    connected: bool,
    unplug_on_rotate: bool,
    closed: bool,
    deg_per_sample: Option<i32>,
    events: Vec<SimEvent>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands received by a simulated motor, in the order they arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Start(Direction),
    SetPower(f32),
    SetSpeed(f32),
    SetAcceleration(u32),
    Stop { brake: bool },
    Rotate { degrees: i32, immediate_return: bool },
    WaitComplete,
    ResetPosition,
    Close
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_speed_degs: DEFAULT_MAX_SPEED_DEGS,
            deg_per_sample: None
        }
    }
}

impl SimMotor {

    /// Create a new simulated motor on the given port with the default configuration.
    pub fn new(port: &str) -> Self {
        Self::with_config(port, &SimConfig::default())
    }

    /// Create a new simulated motor from a configuration.
    pub fn with_config(port: &str, config: &SimConfig) -> Self {
        Self {
            port: port.to_string(),
            state: Arc::new(Mutex::new(SimState {
                position: 0,
                running: None,
                power: 0.0,
                speed: 0.0,
                max_speed: config.max_speed_degs,
                acceleration: 6000,
                holding: false,
                stalled: false,
                connected: true,
                unplug_on_rotate: false,
                closed: false,
                deg_per_sample: config.deg_per_sample,
                events: Vec::new()
            }))
        }
    }

    /// Get a handle which can inspect and manipulate this motor after it has been moved.
    pub fn handle(&self) -> SimHandle {
        SimHandle { state: self.state.clone() }
    }

    /// Lock the state, failing if the motor has been closed or unplugged.
    fn open_state(&self) -> Result<MutexGuard<'_, SimState>, ActuatorError> {
        let state = lock(&self.state);
        if !state.connected {
            return Err(ActuatorError::NotConnected(self.port.clone()))
        }
        if state.closed {
            return Err(ActuatorError::Closed(self.port.clone()))
        }
        Ok(state)
    }
}

impl Actuator for SimMotor {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn start(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.running = Some(direction);
        s.holding = false;
        s.events.push(SimEvent::Start(direction));
        Ok(())
    }

    fn set_power(&mut self, level: f32) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.power = level.abs();
        s.speed = s.power * s.max_speed / 100.0;
        s.events.push(SimEvent::SetPower(level));
        Ok(())
    }

    fn stop(&mut self, brake: bool) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.running = None;
        s.holding = brake;
        s.events.push(SimEvent::Stop { brake });
        Ok(())
    }

    fn position(&mut self) -> Result<i32, ActuatorError> {
        let mut s = self.open_state()?;

        if let Some(dir) = s.running {
            if !s.stalled {
                let step = s.step();
                s.position = s.position.saturating_add(dir.sign() * step);
            }
        }

        trace!("Sim {} position {}", self.port, s.position);
        Ok(s.position)
    }

    fn reset_position(&mut self) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.position = 0;
        s.events.push(SimEvent::ResetPosition);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.running = None;
        s.closed = true;
        s.events.push(SimEvent::Close);
        Ok(())
    }
}

impl RegulatedActuator for SimMotor {
    fn max_speed(&self) -> f32 {
        lock(&self.state).max_speed
    }

    fn set_speed(&mut self, deg_per_s: f32) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.speed = deg_per_s.abs().min(s.max_speed);
        s.power = 100.0 * s.speed / s.max_speed;
        s.events.push(SimEvent::SetSpeed(deg_per_s));
        Ok(())
    }

    fn speed(&self) -> f32 {
        lock(&self.state).speed
    }

    fn set_acceleration(&mut self, deg_per_s2: u32) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.acceleration = deg_per_s2;
        s.events.push(SimEvent::SetAcceleration(deg_per_s2));
        Ok(())
    }

    fn rotate(&mut self, degrees: i32, immediate_return: bool) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        if s.unplug_on_rotate {
            s.connected = false;
            return Err(ActuatorError::NotConnected(self.port.clone()))
        }
        if !s.stalled {
            s.position = s.position.saturating_add(degrees);
        }
        s.running = None;
        s.holding = true;
        s.events.push(SimEvent::Rotate { degrees, immediate_return });
        Ok(())
    }

    fn wait_complete(&mut self) -> Result<(), ActuatorError> {
        let mut s = self.open_state()?;
        s.events.push(SimEvent::WaitComplete);
        Ok(())
    }
}

impl SimState {
    /// Degrees advanced on each read while running.
    fn step(&self) -> i32 {
        match self.deg_per_sample {
            Some(d) => d,
            None if self.power > 0.0 => (self.power / 20.0).ceil() as i32,
            None => 0
        }
    }
}

impl SimHandle {

    /// Current tachometer reading, without advancing the motion model.
    pub fn position(&self) -> i32 {
        lock(&self.state).position
    }

    /// Direction the motor is running in, if any.
    pub fn running(&self) -> Option<Direction> {
        lock(&self.state).running
    }

    /// True if the motor is stopped and actively holding.
    pub fn is_holding(&self) -> bool {
        lock(&self.state).holding
    }

    /// True if the actuator has been closed.
    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Current power magnitude.
    pub fn power(&self) -> f32 {
        lock(&self.state).power
    }

    /// Current acceleration limit.
    pub fn acceleration(&self) -> u32 {
        lock(&self.state).acceleration
    }

    /// Block (or release) the motor. A blocked motor never changes position.
    pub fn set_stalled(&self, stalled: bool) {
        lock(&self.state).stalled = stalled;
    }

    /// Unplug (or plug back in) the motor. An unplugged motor rejects every command.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    /// Unplug the motor as soon as it is asked to rotate, failing that command.
    pub fn set_unplug_on_rotate(&self, unplug: bool) {
        lock(&self.state).unplug_on_rotate = unplug;
    }

    /// Override the number of degrees advanced per read.
    pub fn set_deg_per_sample(&self, deg_per_sample: Option<i32>) {
        lock(&self.state).deg_per_sample = deg_per_sample;
    }

    /// All commands received so far.
    pub fn events(&self) -> Vec<SimEvent> {
        lock(&self.state).events.clone()
    }

    /// Number of received commands matching the predicate.
    pub fn count<F: Fn(&SimEvent) -> bool>(&self, pred: F) -> usize {
        lock(&self.state).events.iter().filter(|e| pred(*e)).count()
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock the state, recovering it if a panicking test poisoned the mutex.
fn lock(state: &Arc<Mutex<SimState>>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_advances_only_while_running() {
        let mut m = SimMotor::new("A");
        let h = m.handle();
        h.set_deg_per_sample(Some(4));

        assert_eq!(m.position().unwrap(), 0);

        m.start(Direction::Backward).unwrap();
        assert_eq!(m.position().unwrap(), -4);
        assert_eq!(m.position().unwrap(), -8);

        m.stop(false).unwrap();
        assert_eq!(m.position().unwrap(), -8);
        assert!(!h.is_holding());
    }

    #[test]
    fn test_closed_motor_rejects_commands() {
        let mut m = SimMotor::new("B");
        m.close().unwrap();

        assert!(matches!(m.start(Direction::Forward), Err(ActuatorError::Closed(_))));
        assert!(matches!(m.position(), Err(ActuatorError::Closed(_))));
    }

    #[test]
    fn test_unplugged_motor_rejects_commands() {
        let mut m = SimMotor::new("D");
        let h = m.handle();

        h.set_connected(false);
        assert!(matches!(m.set_power(10.0), Err(ActuatorError::NotConnected(_))));

        h.set_connected(true);
        assert!(m.set_power(10.0).is_ok());
    }

    #[test]
    fn test_unplug_on_rotate() {
        let mut m = SimMotor::new("D");
        let h = m.handle();
        h.set_unplug_on_rotate(true);

        assert!(matches!(m.rotate(90, true), Err(ActuatorError::NotConnected(_))));
        assert!(matches!(m.position(), Err(ActuatorError::NotConnected(_))));
        assert_eq!(h.position(), 0);
    }

    #[test]
    fn test_rotate_holds() {
        let mut m = SimMotor::new("C");
        let h = m.handle();

        m.set_speed(500.0).unwrap();
        m.rotate(-90, false).unwrap();

        assert_eq!(h.position(), -90);
        assert!(h.is_holding());
        assert_eq!(
            h.events(),
            vec![
                SimEvent::SetSpeed(500.0),
                SimEvent::Rotate { degrees: -90, immediate_return: false }
            ]
        );
    }
}
