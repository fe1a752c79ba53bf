//! Navigation modes: arbitration between manual and autonomous control.
//!
//! Every tick starts with the fault-sampling pass: servo enable, ADC,
//! orientation and GPS validity are re-asserted or re-cleared from the
//! current hardware truth.  Idle and Fault also drive the helm to zero
//! and fault on a failed write.  Only then are mode decisions taken.
//!
//! Precedence between the RC/auto switch and `state.nav_mode`:
//!
//! | commanded      | switch manual | switch auto | switch centred |
//! |----------------|---------------|-------------|----------------|
//! | Idle / Fault   | command       | command     | command        |
//! | RC / Autonomous| RC            | Autonomous  | command        |

use log::debug;

use crate::app::ports::BoatHardware;
use crate::safety::{self, RUDDER_WRITE_FAILED, SERVO_ENABLE_FAILED, THROTTLE_WRITE_FAILED};
use crate::state::BoatState;

use super::{AutoController, AutoMode, Mode, ModeCore, ModeMachine, NavMode, RcController, RcMode, Transition};

enum SubMachine {
    None,
    Rc(ModeMachine<RcController>),
    Auto(ModeMachine<AutoController>),
}

pub struct NavController {
    core: ModeCore<NavMode>,
    sub: SubMachine,
    /// Idle may follow the switch into RC.  Cleared when Idle was
    /// commanded away from RC/Autonomous until the switch leaves manual.
    switch_armed: bool,
}

impl NavController {
    /// Active manual sub-mode, if in RC.
    pub fn rc_mode(&self) -> Option<RcMode> {
        match &self.sub {
            SubMachine::Rc(m) => Some(m.mode()),
            _ => None,
        }
    }

    /// Active autonomous sub-mode, if in Autonomous.
    pub fn auto_mode(&self) -> Option<AutoMode> {
        match &self.sub {
            SubMachine::Auto(m) => Some(m.mode()),
            _ => None,
        }
    }

    fn sample_faults<H: BoatHardware + ?Sized>(state: &mut BoatState, hw: &mut H, drive_safe: bool) {
        state.faults.eval(SERVO_ENABLE_FAILED, !hw.servo_enable_set());
        state.faults.apply(&safety::sensor_checks(hw));
        if drive_safe {
            state.faults.eval(THROTTLE_WRITE_FAILED, !hw.throttle_set(0));
            state.faults.eval(RUDDER_WRITE_FAILED, !hw.rudder_write(0.0));
        }
    }

    fn execute_idle<H: BoatHardware + ?Sized>(&mut self, state: &mut BoatState, hw: &mut H) -> Transition<NavMode> {
        if !state.faults.is_empty() {
            return Transition::To(NavMode::Fault);
        }

        let switch = hw.rc_auto_switch(&state.config);
        if switch != Some(NavMode::Rc) {
            self.switch_armed = true;
        }

        match state.nav_mode {
            NavMode::Fault => Transition::To(NavMode::Fault),
            commanded @ (NavMode::Rc | NavMode::Autonomous) => Transition::To(switch.unwrap_or(commanded)),
            NavMode::Idle | NavMode::None => {
                if self.switch_armed && switch == Some(NavMode::Rc) {
                    Transition::To(NavMode::Rc)
                } else {
                    Transition::Stay
                }
            }
        }
    }

    fn execute_fault(&mut self, state: &mut BoatState) -> Transition<NavMode> {
        if state.faults.is_empty() {
            return Transition::To(NavMode::Idle);
        }
        if state.nav_mode != NavMode::Fault {
            debug!("Ignoring nav mode {} while faulted", state.nav_mode);
            state.nav_mode = NavMode::Fault;
        }
        Transition::Stay
    }

    /// Shared exit logic for RC and Autonomous.  `None` means stay and
    /// delegate to the sub-machine.
    fn arbitrate(&self, state: &mut BoatState, switch: Option<NavMode>) -> Option<NavMode> {
        let this = self.core.mode();
        match state.nav_mode {
            commanded @ (NavMode::Idle | NavMode::Fault) => Some(commanded),
            commanded @ (NavMode::Rc | NavMode::Autonomous) => match switch {
                Some(position) if position != this => Some(position),
                Some(_) => {
                    if commanded != this {
                        debug!("Switch holds {this}; dropping stale {commanded} request");
                        state.nav_mode = this;
                    }
                    None
                }
                None => (commanded != this).then_some(commanded),
            },
            NavMode::None => None,
        }
    }
}

impl Mode for NavController {
    type Kind = NavMode;
    const LEVEL: &'static str = "Nav";

    fn factory(state: &mut BoatState, requested: NavMode) -> Self {
        let this = match requested {
            NavMode::None => NavMode::Idle,
            m => m,
        };
        let last = state.nav_mode;
        state.nav_mode = this;
        let (rc, auto) = (state.rc_mode, state.auto_mode);
        let sub = match this {
            NavMode::Rc => SubMachine::Rc(ModeMachine::new(state, rc)),
            NavMode::Autonomous => SubMachine::Auto(ModeMachine::new(state, auto)),
            _ => SubMachine::None,
        };
        Self {
            core: ModeCore::new(this, last),
            sub,
            switch_armed: !matches!(last, NavMode::Rc | NavMode::Autonomous),
        }
    }

    fn execute<H: BoatHardware + ?Sized>(&mut self, state: &mut BoatState, hw: &mut H) -> Transition<NavMode> {
        self.core.begin_tick();

        let mode = self.core.mode();
        Self::sample_faults(state, hw, matches!(mode, NavMode::Idle | NavMode::Fault | NavMode::None));

        match mode {
            NavMode::Idle | NavMode::None => self.execute_idle(state, hw),
            NavMode::Fault => self.execute_fault(state),
            NavMode::Rc | NavMode::Autonomous => {
                if !state.faults.is_empty() {
                    return Transition::To(NavMode::Fault);
                }
                let switch = hw.rc_auto_switch(&state.config);
                if let Some(next) = self.arbitrate(state, switch) {
                    return Transition::To(next);
                }
                match &mut self.sub {
                    SubMachine::Rc(machine) => {
                        machine.step(state, hw);
                    }
                    SubMachine::Auto(machine) => {
                        machine.step(state, hw);
                    }
                    SubMachine::None => {}
                }
                Transition::Stay
            }
        }
    }

    fn core(&self) -> &ModeCore<NavMode> {
        &self.core
    }

    fn slot(state: &mut BoatState) -> &mut NavMode {
        &mut state.nav_mode
    }
}
