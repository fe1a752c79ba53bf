//! Hackerboat control core.
//!
//! The nested mode hierarchy (boat → navigation → RC / autonomous), the
//! shared [`state::BoatState`], fault aggregation and operator command
//! dispatch.  All hardware is reached through the port traits in
//! [`app::ports`], so everything here runs on a host against mocks or the
//! [`adapters::sim`] boat.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod fsm;
pub mod navigation;
pub mod safety;
pub mod state;

pub use error::{Error, Result};
