//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the pieces that sit around the mode hierarchy:
//! operator command dispatch, outbound events, and the service that runs
//! one control frame.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
