//! Autonomous steering modes: waypoint following, return, anchor.

use hackerboat::control::pid::Gains;
use hackerboat::fsm::{AutoController, AutoMode, Mode, ModeMachine};
use hackerboat::navigation::{GpsFix, Location, WaypointAction, Waypoints};
use hackerboat::safety;
use hackerboat::state::BoatState;

use crate::mock_hw::{HOME, MockBoat, make_state};

fn machine(state: &mut BoatState, mode: AutoMode) -> ModeMachine<AutoController> {
    ModeMachine::new(state, mode)
}

/// Seven points 0.01 degrees apart heading north from HOME.
fn route(action: WaypointAction) -> Waypoints {
    let points = (0..7)
        .map(|i| Location::new(HOME.lat + 0.01 * f64::from(i), HOME.lon))
        .collect();
    Waypoints::new(points, action)
}

// ── Idle ──────────────────────────────────────────────────────

#[test]
fn idle_holds_zero_and_follows_commands() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.throttle = 4;
    let mut m = machine(&mut state, AutoMode::Idle);

    for _ in 0..3 {
        assert_eq!(m.step(&mut state, &mut hw), None);
        assert_eq!(hw.throttle, 0);
        assert_eq!(hw.rudder, 0.0);
    }

    state.auto_mode = AutoMode::Anchor;
    assert_eq!(m.step(&mut state, &mut hw), Some((AutoMode::Idle, AutoMode::Anchor)));
}

// ── Waypoint ──────────────────────────────────────────────────

#[test]
fn waypoint_advances_when_within_tolerance() {
    let mut state = make_state();
    state.waypoints = route(WaypointAction::None);
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, AutoMode::Waypoint);

    assert_eq!(state.waypoints.current(), 0);
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(state.waypoints.current(), 1);
    assert_eq!(m.mode(), AutoMode::Waypoint);
    assert_eq!(hw.throttle, hw.config.auto_default_throttle);
}

#[test]
fn repeat_wraps_from_last_waypoint() {
    let mut state = make_state();
    state.waypoints = route(WaypointAction::Repeat);
    assert!(state.waypoints.set_current(6));
    state.last_fix = GpsFix::new(state.waypoints.points()[6], 0.0, 0.0);
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, AutoMode::Waypoint);

    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(state.waypoints.current(), 0);
    assert_eq!(m.mode(), AutoMode::Waypoint);
}

#[test]
fn route_end_runs_end_action() {
    for (action, expected) in [
        (WaypointAction::Anchor, AutoMode::Anchor),
        (WaypointAction::Return, AutoMode::Return),
        (WaypointAction::Idle, AutoMode::Idle),
        (WaypointAction::None, AutoMode::Idle),
    ] {
        let mut state = make_state();
        state.waypoints = route(action);
        state.waypoints.set_current(6);
        state.last_fix = GpsFix::new(state.waypoints.points()[6], 0.0, 0.0);
        let mut hw = MockBoat::healthy();
        let mut m = machine(&mut state, AutoMode::Waypoint);

        assert_eq!(
            m.step(&mut state, &mut hw),
            Some((AutoMode::Waypoint, expected)),
            "action {action}"
        );
        assert_eq!(state.auto_mode, expected);
    }
}

#[test]
fn far_waypoint_steers_toward_it() {
    let mut state = make_state();
    state.k = Gains::new(1.0, 0.0, 0.0);
    state.waypoints = route(WaypointAction::None);
    state.waypoints.set_current(3);
    let mut hw = MockBoat::healthy();
    // Target is due north; heading 10 is a -10 degree error.
    hw.set_heading(10.0);
    let mut m = machine(&mut state, AutoMode::Waypoint);

    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(state.waypoints.current(), 3);
    assert!((hw.rudder - -10.0).abs() < 1e-6, "rudder {}", hw.rudder);
    assert_eq!(hw.throttle, 5);
}

#[test]
fn refused_helm_writes_raise_faults() {
    let mut state = make_state();
    state.waypoints = route(WaypointAction::None);
    state.waypoints.set_current(3);
    let mut hw = MockBoat::healthy();
    hw.throttle_ok = false;
    let mut m = machine(&mut state, AutoMode::Waypoint);

    assert_eq!(m.step(&mut state, &mut hw), None);
    assert!(state.has_fault(safety::THROTTLE_WRITE_FAILED));
    assert!(!state.has_fault(safety::RUDDER_WRITE_FAILED));

    hw.throttle_ok = true;
    m.step(&mut state, &mut hw);
    assert_eq!(state.fault_count(), 0);
}

#[test]
fn empty_route_drops_to_idle() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, AutoMode::Waypoint);
    assert_eq!(m.step(&mut state, &mut hw), Some((AutoMode::Waypoint, AutoMode::Idle)));
    assert_eq!(hw.throttle, 0);
}

#[test]
fn no_fix_holds_position_outputs() {
    let mut state = make_state();
    state.waypoints = route(WaypointAction::None);
    state.last_fix = GpsFix::default();
    let mut hw = MockBoat::healthy();
    hw.throttle = 3;
    let mut m = machine(&mut state, AutoMode::Waypoint);
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(hw.throttle, 0);
    assert_eq!(state.waypoints.current(), 0);
}

// ── Return ────────────────────────────────────────────────────

#[test]
fn return_without_launch_point_anchors() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, AutoMode::Return);
    assert_eq!(m.step(&mut state, &mut hw), Some((AutoMode::Return, AutoMode::Anchor)));
}

#[test]
fn return_heads_home_then_anchors() {
    let mut state = make_state();
    state.launch_point = HOME;
    state.last_fix = GpsFix::new(Location::new(HOME.lat + 0.02, HOME.lon), 0.0, 0.0);
    let mut hw = MockBoat::healthy();
    hw.set_heading(180.0);
    let mut m = machine(&mut state, AutoMode::Return);

    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(hw.throttle, hw.config.auto_default_throttle);

    state.last_fix = GpsFix::new(HOME, 0.0, 0.0);
    assert_eq!(m.step(&mut state, &mut hw), Some((AutoMode::Return, AutoMode::Anchor)));
}

// ── Anchor ────────────────────────────────────────────────────

#[test]
fn anchor_latches_entry_fix() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    hw.set_heading(190.0);
    let mut m = machine(&mut state, AutoMode::Anchor);

    assert_eq!(m.current().anchor_point(), None);
    m.step(&mut state, &mut hw);
    assert_eq!(m.current().anchor_point(), Some(HOME));
    assert_eq!(state.anchor_point, HOME);
    // Inside the deadband: hold still.
    assert_eq!(hw.throttle, 0);
    assert_eq!(hw.rudder, 0.0);
}

#[test]
fn anchor_reverses_when_anchor_is_astern() {
    let mut state = make_state();
    state.k = Gains::new(1.0, 0.0, 0.0);
    let mut hw = MockBoat::healthy();
    hw.set_heading(185.0);
    let mut m = machine(&mut state, AutoMode::Anchor);
    m.step(&mut state, &mut hw);

    // Drift 0.05 degrees south: the anchor is due north, 175 degrees off the bow.
    state.last_fix = GpsFix::new(Location::new(HOME.lat - 0.05, HOME.lon), 0.0, 0.0);
    assert_eq!(m.step(&mut state, &mut hw), None);
    assert_eq!(hw.throttle, -hw.config.throttle_max);
    assert!((hw.rudder - -5.0).abs() < 1e-6, "rudder {}", hw.rudder);
    assert_eq!(m.current().anchor_point(), Some(HOME));
}

#[test]
fn anchor_drives_forward_when_anchor_is_ahead() {
    let mut state = make_state();
    state.k = Gains::new(1.0, 0.0, 0.0);
    let mut hw = MockBoat::healthy();
    hw.set_heading(10.0);
    let mut m = machine(&mut state, AutoMode::Anchor);
    m.step(&mut state, &mut hw);

    state.last_fix = GpsFix::new(Location::new(HOME.lat - 0.05, HOME.lon), 0.0, 0.0);
    m.step(&mut state, &mut hw);
    assert_eq!(hw.throttle, hw.config.throttle_max);
    assert!((hw.rudder - -10.0).abs() < 1e-6, "rudder {}", hw.rudder);
}

#[test]
fn anchor_follows_commands() {
    let mut state = make_state();
    let mut hw = MockBoat::healthy();
    let mut m = machine(&mut state, AutoMode::Anchor);
    m.step(&mut state, &mut hw);
    state.auto_mode = AutoMode::Waypoint;
    assert_eq!(m.step(&mut state, &mut hw), Some((AutoMode::Anchor, AutoMode::Waypoint)));
    assert_eq!(m.current().last_mode(), AutoMode::Anchor);
}
