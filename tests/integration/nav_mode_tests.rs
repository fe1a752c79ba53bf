//! Navigation-level arbitration between the RC switch, operator commands
//! and faults.

use hackerboat::fsm::{AutoMode, Mode, ModeMachine, NavController, NavMode, RcMode};
use hackerboat::safety;
use hackerboat::state::BoatState;

use crate::mock_hw::{MockBoat, make_state};

fn machine(state: &mut BoatState, mode: NavMode) -> ModeMachine<NavController> {
    ModeMachine::new(state, mode)
}

// ── Idle ──────────────────────────────────────────────────────

#[test]
fn idle_stays_idle_with_switch_centred() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.rudder = 12.0;
    hw.throttle = 2;
    let mut m = machine(&mut state, NavMode::Idle);
    for _ in 0..5 {
        assert_eq!(m.step(&mut state, &mut hw), None);
        assert_eq!(hw.rudder, 0.0);
        assert_eq!(hw.throttle, 0);
    }
    assert!(hw.servo_enabled);
}

#[test]
fn idle_follows_manual_switch() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Idle);
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Rc)));
    assert_eq!(state.nav_mode, NavMode::Rc);
    assert_eq!(m.current().rc_mode(), Some(RcMode::Idle));
}

#[test]
fn idle_follows_commands() {
    for target in [NavMode::Rc, NavMode::Autonomous, NavMode::Fault] {
        let mut state = make_state();
        let mut hw = MockBoat::healthy();
        let mut m = machine(&mut state, NavMode::Idle);
        state.nav_mode = target;
        assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, target)));
    }
}

#[test]
fn switch_position_beats_conflicting_command() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_auto();
    let mut m = machine(&mut state, NavMode::Idle);
    state.nav_mode = NavMode::Rc;
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Autonomous)));
}

// ── Fault ─────────────────────────────────────────────────────

#[test]
fn fault_entry_and_safe_outputs() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Idle);
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Rc)));

    state.insert_fault("Test Fault");
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Fault)));

    hw.rudder = 20.0;
    hw.throttle = 5;
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(hw.rudder, 0.0);
    assert_eq!(hw.throttle, 0);
}

#[test]
fn fault_exit_when_cleared() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, NavMode::Idle);
    state.insert_fault("Test Fault");
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Fault)));
    assert_eq!(m.step(&mut state, &mut hw), None);

    state.clear_faults();
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Fault, NavMode::Idle)));
}

#[test]
fn fault_ignores_commands() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, NavMode::Fault);
    state.insert_fault("Test Fault");
    state.nav_mode = NavMode::Autonomous;
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(state.nav_mode, NavMode::Fault);
}

#[test]
fn sensor_loss_is_sampled_and_self_heals() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Rc);

    hw.orientation_valid = false;
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Fault)));
    assert!(state.has_fault(safety::ORIENTATION_INVALID));

    m.step(&mut state, &mut hw);
    assert_eq!(m.mode(), NavMode::Fault);

    hw.orientation_valid = true;
    m.step(&mut state, &mut hw);
    assert!(!state.has_fault(safety::ORIENTATION_INVALID));
    assert_eq!(m.mode(), NavMode::Idle);
}

#[test]
fn actuator_refusal_is_a_fault() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.throttle_ok = false;
    let mut m = machine(&mut state, NavMode::Idle);
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Fault)));
    assert!(state.has_fault(safety::THROTTLE_WRITE_FAILED));

    hw.throttle_ok = true;
    m.step(&mut state, &mut hw);
    assert!(!state.has_fault(safety::THROTTLE_WRITE_FAILED));
    assert_eq!(m.mode(), NavMode::Idle);
}

// ── RC / Autonomous ───────────────────────────────────────────

#[test]
fn rc_to_autonomous_by_switch() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Rc);
    assert_eq!(m.step(&mut state, &mut hw), None);

    hw.auto_switch_auto();
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Autonomous)));
    assert_eq!(m.current().auto_mode(), Some(AutoMode::Idle));
}

#[test]
fn autonomous_by_command_with_switch_centred() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, NavMode::Rc);
    state.nav_mode = NavMode::Autonomous;
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Autonomous)));
}

#[test]
fn manual_switch_overrides_autonomous_command() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Rc);
    state.nav_mode = NavMode::Autonomous;
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(state.nav_mode, NavMode::Rc);
}

#[test]
fn commanded_idle_holds_until_switch_cycles() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_manual();
    let mut m = machine(&mut state, NavMode::Rc);
    m.step(&mut state, &mut hw);

    state.nav_mode = NavMode::Idle;
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Idle)));
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(m.step(&mut state, &mut hw), None);

    hw.auto_switch_centre();
    assert_eq!(m.step(&mut state, &mut hw), None);
    hw.auto_switch_manual();
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Idle, NavMode::Rc)));
}

#[test]
fn rc_delegates_to_rc_sub_mode() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let rc = hw.config.rc.clone();
    hw.auto_switch_manual();
    hw.mode_switch(rc.min);
    hw.set_channel(rc.throttle_channel, rc.max);
    let mut m = machine(&mut state, NavMode::Rc);

    m.step(&mut state, &mut hw);
    assert_eq!(m.current().rc_mode(), Some(RcMode::Rudder));
    m.step(&mut state, &mut hw);
    assert_eq!(hw.throttle, hw.config.throttle_max);
}

#[test]
fn helm_failure_under_rc_demotes_to_fault() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let rc = hw.config.rc.clone();
    hw.auto_switch_manual();
    hw.mode_switch(rc.min);
    let mut m = machine(&mut state, NavMode::Rc);
    m.step(&mut state, &mut hw);
    assert_eq!(m.current().rc_mode(), Some(RcMode::Rudder));

    hw.rudder_ok = false;
    hw.throttle_ok = false;
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert!(state.has_fault(safety::RUDDER_WRITE_FAILED));
    assert!(state.has_fault(safety::THROTTLE_WRITE_FAILED));
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Rc, NavMode::Fault)));
    assert_eq!(m.step(&mut state, &mut hw), None);

    hw.rudder_ok = true;
    hw.throttle_ok = true;
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Fault, NavMode::Idle)));
}

#[test]
fn helm_failure_under_autonomous_demotes_to_fault() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.auto_switch_auto();
    hw.throttle_ok = false;
    let mut m = machine(&mut state, NavMode::Autonomous);

    assert_eq!(m.step(&mut state, &mut hw), None);
    assert!(state.has_fault(safety::THROTTLE_WRITE_FAILED));
    assert_eq!(m.step(&mut state, &mut hw), Some((NavMode::Autonomous, NavMode::Fault)));
}

#[test]
fn sub_machine_primed_from_state() {
    let mut state = make_state();
    state.auto_mode = AutoMode::Anchor;
    let m = machine(&mut state, NavMode::Autonomous);
    assert_eq!(m.current().auto_mode(), Some(AutoMode::Anchor));
    assert_eq!(m.current().rc_mode(), None);
    assert_eq!(m.current().last_mode(), NavMode::None);
}
