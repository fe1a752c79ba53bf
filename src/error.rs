//! Unified error types for the boat control core.
//!
//! A single `Error` enum that every subsystem can convert into.  Vessel
//! health problems never appear here: those are named faults in
//! [`FaultSet`](crate::safety::FaultSet), polled by the mode hierarchy.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The record store failed.
    Storage(StorageError),
    /// A persisted record could not be encoded or decoded.
    Record(&'static str),
    /// An operator command was rejected.
    Command(CommandError),
    /// Startup could not complete.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Record(msg) => write!(f, "record: {msg}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Self::Record("postcard encoding failed")
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Why a command was not applied.  Reported to the sender as a failed
/// execution, never escalated to a vessel fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// No handler is registered under this name.
    UnknownCommand,
    /// The command name does not fit the queue's name buffer.
    NameTooLong,
    /// The queue is at capacity.
    QueueFull,
    /// A required argument is absent or has the wrong JSON type.
    MissingArgument(&'static str),
    /// An argument is present but its value is not acceptable.
    InvalidArgument(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::NameTooLong => write!(f, "command name too long"),
            Self::QueueFull => write!(f, "command queue full"),
            Self::MissingArgument(arg) => write!(f, "missing argument '{arg}'"),
            Self::InvalidArgument(arg) => write!(f, "invalid argument '{arg}'"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
