//! Operator commands.
//!
//! REST/MQTT handler threads push [`Command`]s through a
//! [`CommandSender`]; the control thread drains them from the shared
//! [`CommandQueue`] and applies each one to [`BoatState`] through the
//! name → handler table below.
//!
//! ```text
//! ┌──────────────┐   Command    ┌───────────────┐
//! │ REST / MQTT  │─────────────▶│ Control loop  │
//! │ (any thread) │  try_send    │ (mode machine)│
//! └──────────────┘              └───────────────┘
//! ```

use std::str::FromStr;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;
use serde_json::Value;

use crate::control::pid::Gains;
use crate::error::CommandError;
use crate::fsm::{AutoMode, BoatMode, NavMode};
use crate::navigation::{Location, WaypointAction};
use crate::state::BoatState;

/// Longest accepted command name.
pub const COMMAND_NAME_LEN: usize = 32;

/// Commands that can wait for the control thread.
pub const COMMAND_QUEUE_DEPTH: usize = 64;

// ───────────────────────────────────────────────────────────────
// Command
// ───────────────────────────────────────────────────────────────

/// A named operator request with JSON arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: heapless::String<COMMAND_NAME_LEN>,
    args: Value,
}

impl Command {
    pub fn new(name: &str, args: Value) -> Result<Self, CommandError> {
        let mut bounded = heapless::String::new();
        bounded
            .push_str(name)
            .map_err(|()| CommandError::NameTooLong)?;
        Ok(Self {
            name: bounded,
            args,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &Value {
        &self.args
    }

    /// Apply the command to `state`.
    pub fn execute(&self, state: &mut BoatState) -> Result<(), CommandError> {
        let handler = HANDLERS
            .iter()
            .find(|(name, _)| *name == self.name.as_str())
            .map(|(_, handler)| *handler)
            .ok_or(CommandError::UnknownCommand)?;
        handler(state, &self.args)
    }

    /// True for a `SetMode` naming `mode`.
    pub fn requests_boat_mode(&self, mode: BoatMode) -> bool {
        self.name.as_str() == "SetMode"
            && parse_name::<BoatMode>(&self.args, "mode").is_ok_and(|m| m == mode)
    }
}

// ───────────────────────────────────────────────────────────────
// Queue
// ───────────────────────────────────────────────────────────────

/// FIFO of pending commands, safe for many producers.
pub struct CommandQueue {
    channel: Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>,
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Append without blocking.  Fails when the queue is full.
    pub fn push(&self, cmd: Command) -> Result<(), CommandError> {
        self.channel
            .try_send(cmd)
            .map_err(|_| CommandError::QueueFull)
    }

    /// Take the oldest command, if any.
    pub fn pop(&self) -> Option<Command> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Discard everything queued.  Returns how many commands were dropped.
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.pop().is_some() {
            dropped += 1;
        }
        dropped
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle given to interface threads.
#[derive(Clone)]
pub struct CommandSender {
    queue: Arc<CommandQueue>,
}

impl CommandSender {
    pub fn new(queue: Arc<CommandQueue>) -> Self {
        Self { queue }
    }

    /// Queue `name` with `args`.  Returns false if the command was refused.
    pub fn push_cmd(&self, name: &str, args: Value) -> bool {
        match Command::new(name, args).and_then(|cmd| self.queue.push(cmd)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Command {name} refused: {e}");
                false
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Dispatch table
// ───────────────────────────────────────────────────────────────

type Handler = fn(&mut BoatState, &Value) -> Result<(), CommandError>;

const HANDLERS: &[(&str, Handler)] = &[
    ("SetMode", set_mode),
    ("SetNavMode", set_nav_mode),
    ("SetAutoMode", set_auto_mode),
    ("SetHome", set_home),
    ("SetWaypoint", set_waypoint),
    ("SetWaypointAction", set_waypoint_action),
    ("SetPID", set_pid),
];

/// Names of every command the dispatcher understands.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    HANDLERS.iter().map(|(name, _)| *name)
}

fn parse_name<T: FromStr>(args: &Value, key: &'static str) -> Result<T, CommandError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or(CommandError::MissingArgument(key))?
        .parse()
        .map_err(|_| CommandError::InvalidArgument(key))
}

/// A mode name other than the `None` sentinel.
fn parse_mode<T: FromStr + Default + PartialEq>(args: &Value, key: &'static str) -> Result<T, CommandError> {
    let mode = parse_name::<T>(args, key)?;
    if mode == T::default() {
        return Err(CommandError::InvalidArgument(key));
    }
    Ok(mode)
}

fn set_mode(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    state.boat_mode = parse_mode::<BoatMode>(args, "mode")?;
    Ok(())
}

fn set_nav_mode(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    state.nav_mode = parse_mode::<NavMode>(args, "mode")?;
    Ok(())
}

fn set_auto_mode(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    state.auto_mode = parse_mode::<AutoMode>(args, "mode")?;
    Ok(())
}

fn set_home(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    let location = args
        .get("location")
        .ok_or(CommandError::MissingArgument("location"))?;
    let lat = location
        .get("lat")
        .and_then(Value::as_f64)
        .ok_or(CommandError::MissingArgument("lat"))?;
    let lon = location
        .get("lon")
        .and_then(Value::as_f64)
        .ok_or(CommandError::MissingArgument("lon"))?;
    let home = Location::new(lat, lon);
    if !home.is_valid() {
        return Err(CommandError::InvalidArgument("location"));
    }
    state.launch_point = home;
    Ok(())
}

fn set_waypoint(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    let number = args.get("number").ok_or(CommandError::MissingArgument("number"))?;
    let index = number
        .as_i64()
        .or_else(|| number.as_f64().map(|n| n as i64))
        .ok_or(CommandError::InvalidArgument("number"))?;
    if state.waypoints.set_current(index) {
        Ok(())
    } else {
        Err(CommandError::InvalidArgument("number"))
    }
}

fn set_waypoint_action(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    let action = parse_name::<WaypointAction>(args, "action")?;
    state.waypoints.set_action(action);
    Ok(())
}

fn set_pid(state: &mut BoatState, args: &Value) -> Result<(), CommandError> {
    let gain = |key: &'static str| -> Result<Option<f64>, CommandError> {
        match args.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .filter(|g| g.is_finite() && *g >= 0.0)
                .map(Some)
                .ok_or(CommandError::InvalidArgument(key)),
        }
    };
    let (kp, ki, kd) = (gain("Kp")?, gain("Ki")?, gain("Kd")?);
    if kp.is_none() && ki.is_none() && kd.is_none() {
        return Err(CommandError::MissingArgument("Kp"));
    }
    let k = state.k;
    state.k = Gains::new(kp.unwrap_or(k.kp), ki.unwrap_or(k.ki), kd.unwrap_or(k.kd));
    Ok(())
}
