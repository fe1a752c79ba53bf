//! Boat-level modes: the safety envelope.
//!
//! This is the only level that touches the arm/disarm relays.  Relay
//! pulses are tied to transition edges in [`BoatController::on_transition`]
//! so no path into or out of Navigation can skip one:
//!
//! | edge                         | pulse                    |
//! |------------------------------|--------------------------|
//! | any → Navigation             | ENABLE                   |
//! | Navigation → anything but Fault | DISARM                |
//! | SelfTest → Disarmed          | DISARM, servo disabled   |
//! | Fault, first tick            | DISARM                   |

use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::BoatHardware;
use crate::config::{RELAY_DISARM, RELAY_ENABLE, RELAY_HORN};
use crate::safety::{self, RUDDER_WRITE_FAILED, SERVO_ENABLE_FAILED, THROTTLE_WRITE_FAILED};
use crate::state::BoatState;

use super::{BoatMode, Mode, ModeCore, ModeMachine, NavController, NavMode, Transition};

pub struct BoatController {
    core: ModeCore<BoatMode>,
    /// Navigation sub-machine, present only in `Navigation`.
    nav: Option<ModeMachine<NavController>>,
    /// Self-test start.
    started: Option<Duration>,
    /// Horn start while the arm handshake is running.
    horn_started: Option<Duration>,
    /// Nav mode to resume if self-test may skip the disarm handshake.
    resume_nav: Option<NavMode>,
}

/// Drive `relay` for the configured pulse width.
fn pulse_relay<H: BoatHardware + ?Sized>(relay: &str, state: &BoatState, hw: &mut H) {
    if !hw.relay_set(relay) {
        warn!("Relay {relay} failed to set");
    }
    hw.delay_ms(u32::try_from(state.config.relay_pulse_ms).unwrap_or(u32::MAX));
    if !hw.relay_clear(relay) {
        warn!("Relay {relay} failed to clear");
    }
    info!("Pulsed relay {relay}");
}

/// Where Fault and LowBattery hand control back to.
fn resume_target(last: BoatMode) -> BoatMode {
    match last {
        BoatMode::SelfTest | BoatMode::Disarmed | BoatMode::Navigation => last,
        _ => BoatMode::Disarmed,
    }
}

fn below_cutoff<H: BoatHardware + ?Sized>(state: &BoatState, hw: &H) -> bool {
    hw.battery_mon() < state.config.low_battery_cutoff
}

/// Hold the helm at rest and record any actuator that refuses.
fn safe_outputs<H: BoatHardware + ?Sized>(state: &mut BoatState, hw: &mut H, rudder: bool) {
    state
        .faults
        .eval(SERVO_ENABLE_FAILED, !hw.servo_enable_clear());
    state
        .faults
        .eval(THROTTLE_WRITE_FAILED, !hw.throttle_set(0));
    if rudder {
        state.faults.eval(RUDDER_WRITE_FAILED, !hw.rudder_write(0.0));
    }
}

impl BoatController {
    pub fn nav_machine(&self) -> Option<&ModeMachine<NavController>> {
        self.nav.as_ref()
    }

    /// Live nav mode, if in Navigation.
    pub fn nav_mode(&self) -> Option<NavMode> {
        self.nav.as_ref().map(ModeMachine::mode)
    }

    /// True while the arm-handshake horn is sounding.
    pub fn horn_on(&self) -> bool {
        self.horn_started.is_some()
    }

    fn silence_horn<H: BoatHardware + ?Sized>(&mut self, hw: &mut H) {
        if self.horn_started.take().is_some() {
            hw.relay_clear(RELAY_HORN);
        }
    }

    /// Apply at most one queued command, then act on any boat mode it
    /// requested.  Modes outside `allowed` are reverted.
    fn drain_one(&mut self, state: &mut BoatState, allowed: &[BoatMode]) -> Option<BoatMode> {
        let cmd = state.pop_cmd()?;
        state.execute_cmd(&cmd);
        let this = self.core.mode();
        match state.boat_mode {
            m if m == this => None,
            m if allowed.contains(&m) => Some(m),
            m => {
                warn!("Boat mode {m} cannot be requested from {this}");
                state.boat_mode = this;
                None
            }
        }
    }

    fn execute_self_test<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
        first: bool,
    ) -> Transition<BoatMode> {
        let now = hw.now();
        if first {
            self.started = Some(now);
            self.resume_nav =
                (self.core.last_mode() == BoatMode::Navigation).then_some(state.nav_mode);
            state.clear_faults();
        }

        state
            .faults
            .eval(SERVO_ENABLE_FAILED, !hw.servo_enable_set());
        let checks = safety::self_test_checks(state, hw);
        state.faults.apply(&checks);

        if below_cutoff(state, hw) {
            return Transition::To(BoatMode::LowBattery);
        }

        let started = *self.started.get_or_insert(now);
        if now.saturating_sub(started) < state.config.self_test_delay() {
            return Transition::Stay;
        }

        if !state.faults.is_empty() {
            warn!("Self-test failed: {}", state.fault_string());
            return Transition::To(BoatMode::Fault);
        }
        match self.resume_nav {
            Some(nav) if hw.arm_input().is_high() => {
                info!("Resuming navigation in {nav}");
                state.nav_mode = nav;
                Transition::To(BoatMode::Navigation)
            }
            _ => Transition::To(BoatMode::Disarmed),
        }
    }

    fn execute_disarmed<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<BoatMode> {
        safe_outputs(state, hw, false);

        if below_cutoff(state, hw) {
            self.silence_horn(hw);
            return Transition::To(BoatMode::LowBattery);
        }
        if !state.faults.is_empty() {
            self.silence_horn(hw);
            return Transition::To(BoatMode::Fault);
        }
        if let Some(next) = self.drain_one(state, &[BoatMode::SelfTest, BoatMode::Navigation]) {
            self.silence_horn(hw);
            return Transition::To(next);
        }

        let now = hw.now();
        match (hw.arm_input().is_high(), self.horn_started) {
            (true, None) => {
                info!("Arm input asserted, sounding horn");
                hw.relay_set(RELAY_HORN);
                self.horn_started = Some(now);
                Transition::Stay
            }
            (true, Some(t)) if now.saturating_sub(t) >= state.config.horn_time() => {
                self.silence_horn(hw);
                Transition::To(BoatMode::Navigation)
            }
            (true, Some(_)) => Transition::Stay,
            (false, Some(_)) => {
                info!("Arm input released during horn");
                self.silence_horn(hw);
                Transition::Stay
            }
            (false, None) => Transition::Stay,
        }
    }

    fn execute_fault<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
        first: bool,
    ) -> Transition<BoatMode> {
        if first {
            pulse_relay(RELAY_DISARM, state, hw);
        }
        safe_outputs(state, hw, true);
        if below_cutoff(state, hw) {
            return Transition::To(BoatMode::LowBattery);
        }

        if let Some(cmd) = state.pop_cmd() {
            if cmd.requests_boat_mode(BoatMode::SelfTest) {
                state.execute_cmd(&cmd);
                return Transition::To(BoatMode::SelfTest);
            }
            warn!("Ignoring command {} while faulted", cmd.name());
        }

        let mut checks = safety::self_test_checks(state, hw);
        checks.extend(safety::sensor_checks(hw));
        state.faults.clear_healthy(&checks);

        if state.faults.is_empty() {
            Transition::To(resume_target(self.core.last_mode()))
        } else {
            Transition::Stay
        }
    }

    fn execute_navigation<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<BoatMode> {
        if below_cutoff(state, hw) {
            return Transition::To(BoatMode::LowBattery);
        }
        if let Some(next) = self.drain_one(state, &[BoatMode::SelfTest, BoatMode::Disarmed]) {
            return Transition::To(next);
        }
        if hw.disarm_input().is_high() || !hw.arm_input().is_high() {
            info!("Disarm requested by safety inputs");
            return Transition::To(BoatMode::Disarmed);
        }

        let Some(nav) = self.nav.as_mut() else {
            return Transition::To(BoatMode::Disarmed);
        };
        nav.step(state, hw);

        if !state.faults.is_empty() || nav.mode() == NavMode::Fault {
            Transition::To(BoatMode::Fault)
        } else {
            Transition::Stay
        }
    }

    fn execute_low_battery<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<BoatMode> {
        safe_outputs(state, hw, true);
        let restart = state.config.low_battery_cutoff + state.config.low_battery_hysteresis;
        let volts = hw.battery_mon();
        if volts >= restart {
            info!("Battery recovered at {volts:.2} V");
            Transition::To(resume_target(self.core.last_mode()))
        } else {
            debug!("Battery low: {volts:.2} V");
            Transition::Stay
        }
    }
}

impl Mode for BoatController {
    type Kind = BoatMode;
    const LEVEL: &'static str = "Boat";

    fn factory(state: &mut BoatState, requested: BoatMode) -> Self {
        let this = match requested {
            BoatMode::None => BoatMode::Start,
            m => m,
        };
        let last = state.boat_mode;
        state.boat_mode = this;

        let nav = (this == BoatMode::Navigation).then(|| {
            let initial = match state.nav_mode {
                m @ (NavMode::Idle | NavMode::Rc | NavMode::Autonomous) => m,
                _ => NavMode::Idle,
            };
            ModeMachine::new(state, initial)
        });

        Self {
            core: ModeCore::new(this, last),
            nav,
            started: None,
            horn_started: None,
            resume_nav: None,
        }
    }

    fn execute<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<BoatMode> {
        let first = self.core.begin_tick();

        match self.core.mode() {
            BoatMode::Start | BoatMode::None => {
                state.get_last_record();
                Transition::To(BoatMode::SelfTest)
            }
            BoatMode::SelfTest => self.execute_self_test(state, hw, first),
            BoatMode::Disarmed => self.execute_disarmed(state, hw),
            BoatMode::Fault => self.execute_fault(state, hw, first),
            BoatMode::Navigation => self.execute_navigation(state, hw),
            BoatMode::ArmedTest if below_cutoff(state, hw) => Transition::To(BoatMode::LowBattery),
            BoatMode::ArmedTest => Transition::To(BoatMode::Disarmed),
            BoatMode::LowBattery => self.execute_low_battery(state, hw),
        }
    }

    fn core(&self) -> &ModeCore<BoatMode> {
        &self.core
    }

    fn slot(state: &mut BoatState) -> &mut BoatMode {
        &mut state.boat_mode
    }

    fn on_transition<H: BoatHardware + ?Sized>(
        from: BoatMode,
        to: BoatMode,
        state: &mut BoatState,
        hw: &mut H,
    ) {
        if to == BoatMode::Navigation && from != BoatMode::Navigation {
            pulse_relay(RELAY_ENABLE, state, hw);
        }
        if from == BoatMode::Navigation && to != BoatMode::Fault {
            pulse_relay(RELAY_DISARM, state, hw);
        }
        if from == BoatMode::SelfTest && to == BoatMode::Disarmed {
            pulse_relay(RELAY_DISARM, state, hw);
            hw.servo_enable_clear();
        }
    }
}
