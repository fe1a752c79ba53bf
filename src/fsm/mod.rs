//! Nested mode machines.
//!
//! Four levels, each a closed set of modes:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ BoatMode   Start · SelfTest · Disarmed · Fault · Navigation       │
//! │            ArmedTest · LowBattery                                 │
//! │   └─ Navigation owns ─▶ NavMode  Idle · Fault · RC · Autonomous   │
//! │                            ├─ RC owns   ─▶ RcMode                 │
//! │                            │   Idle · Rudder · Course · Failsafe  │
//! │                            └─ Autonomous owns ─▶ AutoMode         │
//! │                                Idle · Waypoint · Return · Anchor  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the owning [`ModeMachine`] calls [`Mode::execute`] on the
//! live mode.  A mode answers [`Transition::Stay`] or
//! [`Transition::To`]; on a transition the machine runs the level's
//! per-pair side effects ([`Mode::on_transition`]) and then replaces
//! the live mode with a fresh one built by [`Mode::factory`].  The old
//! mode (and any sub-machine it owned) is dropped at that point, so at
//! most one mode per level is ever alive.

pub mod auto;
pub mod boat;
pub mod nav;
pub mod rc;

use core::fmt;

use log::info;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::app::ports::BoatHardware;
use crate::safety::{RUDDER_WRITE_FAILED, THROTTLE_WRITE_FAILED};
use crate::state::BoatState;

pub use auto::AutoController;
pub use boat::BoatController;
pub use nav::NavController;
pub use rc::RcController;

// ---------------------------------------------------------------------------
// Mode identities
// ---------------------------------------------------------------------------

/// Top-level safety envelope.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum BoatMode {
    Start,
    SelfTest,
    Disarmed,
    Fault,
    Navigation,
    ArmedTest,
    LowBattery,
    #[default]
    None,
}

/// Manual/autonomous arbitration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum NavMode {
    Idle,
    Fault,
    #[strum(serialize = "RC")]
    Rc,
    Autonomous,
    #[default]
    None,
}

/// Manual steering policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum RcMode {
    Idle,
    Rudder,
    Course,
    Failsafe,
    #[default]
    None,
}

/// Autonomous steering policy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum AutoMode {
    Idle,
    Waypoint,
    Return,
    Anchor,
    #[default]
    None,
}

// ---------------------------------------------------------------------------
// Mode contract
// ---------------------------------------------------------------------------

/// Result of one [`Mode::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<K> {
    Stay,
    To(K),
}

/// Bookkeeping shared by every mode instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCore<K> {
    this: K,
    last: K,
    call_count: u64,
}

impl<K: Copy> ModeCore<K> {
    pub fn new(this: K, last: K) -> Self {
        Self {
            this,
            last,
            call_count: 0,
        }
    }

    pub fn mode(&self) -> K {
        self.this
    }

    pub fn last_mode(&self) -> K {
        self.last
    }

    /// Ticks executed since this instance was built.
    pub fn count(&self) -> u64 {
        self.call_count
    }

    /// Count a tick.  Returns true on the first tick of this instance.
    pub fn begin_tick(&mut self) -> bool {
        self.call_count += 1;
        self.call_count == 1
    }
}

/// One level of the hierarchy.
pub trait Mode: Sized {
    type Kind: Copy + Eq + fmt::Display;

    /// Label used in transition logs.
    const LEVEL: &'static str;

    /// Build the mode for `requested`, falling back to the level's idle
    /// variant on `None`.  Records the level's current state field as
    /// `last` and then overwrites that field with the new mode.
    fn factory(state: &mut BoatState, requested: Self::Kind) -> Self;

    /// Advance one tick.
    fn execute<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<Self::Kind>;

    fn core(&self) -> &ModeCore<Self::Kind>;

    /// The [`BoatState`] field mirroring this level's mode.
    fn slot(state: &mut BoatState) -> &mut Self::Kind;

    /// Side effects bound to a specific `from -> to` edge.  Runs after the
    /// old mode's last tick and before the new mode is built.
    fn on_transition<H: BoatHardware + ?Sized>(
        _from: Self::Kind,
        _to: Self::Kind,
        _state: &mut BoatState,
        _hw: &mut H,
    ) {
    }

    fn mode(&self) -> Self::Kind {
        self.core().mode()
    }

    fn last_mode(&self) -> Self::Kind {
        self.core().last_mode()
    }

    fn count(&self) -> u64 {
        self.core().count()
    }
}

/// Write both helm outputs.  A refused write raises its fault and a
/// landed one clears it; the navigation level acts on either next tick.
pub(crate) fn drive_helm<H: BoatHardware + ?Sized>(
    state: &mut BoatState,
    hw: &mut H,
    rudder: f64,
    throttle: i32,
) {
    state.faults.eval(RUDDER_WRITE_FAILED, !hw.rudder_write(rudder));
    state.faults.eval(THROTTLE_WRITE_FAILED, !hw.throttle_set(throttle));
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Sole owner of the live mode at one level.
pub struct ModeMachine<M: Mode> {
    current: M,
}

impl<M: Mode> ModeMachine<M> {
    /// Start the level in `initial` via the factory.
    pub fn new(state: &mut BoatState, initial: M::Kind) -> Self {
        let current = M::factory(state, initial);
        info!("{} starting in mode: {}", M::LEVEL, current.mode());
        Self { current }
    }

    /// Run one tick.  Returns the `(from, to)` pair if the mode changed.
    pub fn step<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Option<(M::Kind, M::Kind)> {
        match self.current.execute(state, hw) {
            Transition::Stay => None,
            Transition::To(next) => {
                let from = self.current.mode();
                M::on_transition(from, next, state, hw);
                // A command may already have written `next` into the slot.
                let slot = M::slot(state);
                if *slot == next {
                    *slot = from;
                }
                self.current = M::factory(state, next);
                let to = self.current.mode();
                info!("{} transition: {} -> {}", M::LEVEL, from, to);
                Some((from, to))
            }
        }
    }

    pub fn mode(&self) -> M::Kind {
        self.current.mode()
    }

    pub fn current(&self) -> &M {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut M {
        &mut self.current
    }
}

/// Shorthand for the mode at the top of the hierarchy.
pub type BoatMachine = ModeMachine<BoatController>;
