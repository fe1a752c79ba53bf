//! BoatService orchestration: frame snapshots, events and records.

use std::time::Duration;

use hackerboat::adapters::store::{FileStore, MemoryStore};
use hackerboat::app::events::BoatEvent;
use hackerboat::app::service::BoatService;
use hackerboat::config::BoatConfig;
use hackerboat::fsm::{BoatMode, Mode, NavMode};
use hackerboat::navigation::Location;
use serde_json::json;

use crate::mock_hw::{FailingStore, HOME, MockBoat, RecordingSink};

fn service() -> BoatService {
    BoatService::new(BoatConfig::default(), Box::new(MemoryStore::new()))
}

/// Tick until self-test has passed.
fn boot(svc: &mut BoatService, hw: &mut MockBoat, sink: &mut RecordingSink) {
    svc.start(sink);
    svc.tick(hw, sink);
    svc.tick(hw, sink);
    hw.advance(hw.config.self_test_delay());
    svc.tick(hw, sink);
    assert_eq!(svc.boat_mode(), BoatMode::Disarmed);
}

fn boat_changes(sink: &RecordingSink) -> Vec<(BoatMode, BoatMode)> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            BoatEvent::BoatModeChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn boot_sequence_emits_mode_changes() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);

    assert_eq!(sink.events[0], BoatEvent::Started(BoatMode::Start));
    assert_eq!(
        boat_changes(&sink),
        [
            (BoatMode::Start, BoatMode::SelfTest),
            (BoatMode::SelfTest, BoatMode::Disarmed)
        ]
    );
    assert_eq!(svc.tick_count(), 3);
}

#[test]
fn tick_without_start_starts() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    svc.tick(&mut hw, &mut sink);
    assert!(matches!(sink.events[0], BoatEvent::Started(BoatMode::Start)));
    assert_eq!(svc.boat_mode(), BoatMode::SelfTest);
}

#[test]
fn frame_snapshot_refreshes_state() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);

    hw.set_fix(Location::new(47.6, -122.4));
    hw.set_heading(90.0);
    hw.advance(Duration::from_secs(4));
    svc.tick(&mut hw, &mut sink);

    let state = svc.state();
    assert_eq!(state.record_time, hw.now);
    assert_eq!(state.last_rc, hw.now);
    assert_eq!(state.last_fix.fix, Location::new(47.6, -122.4));
    assert_eq!(state.orientation.heading, 90.0);
}

#[test]
fn stale_inputs_are_not_copied() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    svc.tick(&mut hw, &mut sink);
    let rc_time = svc.state().last_rc;

    hw.gps_valid = false;
    hw.set_fix(Location::new(10.0, 10.0));
    hw.rc_failsafe = true;
    hw.advance(Duration::from_secs(1));
    svc.tick(&mut hw, &mut sink);

    assert_eq!(svc.state().last_fix.fix, HOME);
    assert_eq!(svc.state().last_rc, rc_time);
}

#[test]
fn fault_events_report_raise_and_clear() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    hw.rc_valid = false;
    svc.start(&mut sink);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);

    assert!(sink.events.iter().any(|e| matches!(
        e,
        BoatEvent::FaultDetected(f) if f.contains("RC input invalid")
    )));

    hw.rc_valid = true;
    svc.tick(&mut hw, &mut sink);
    assert_eq!(sink.events.last(), Some(&BoatEvent::FaultCleared));
}

#[test]
fn arming_reports_nav_start() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);

    hw.set_armed(true);
    svc.tick(&mut hw, &mut sink);
    hw.advance(hw.config.horn_time());
    svc.tick(&mut hw, &mut sink);

    assert_eq!(svc.boat_mode(), BoatMode::Navigation);
    assert_eq!(svc.nav_mode(), Some(NavMode::Idle));
    assert!(sink.events.contains(&BoatEvent::NavModeChanged {
        from: NavMode::None,
        to: NavMode::Idle,
    }));

    hw.auto_switch_manual();
    svc.tick(&mut hw, &mut sink);
    assert_eq!(sink.events.last(), Some(&BoatEvent::NavModeChanged {
        from: NavMode::Idle,
        to: NavMode::Rc,
    }));
}

#[test]
fn queued_commands_reach_the_machine() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);

    assert!(svc.command_sender().push_cmd("SetMode", json!({ "mode": "SelfTest" })));
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.boat_mode(), BoatMode::SelfTest);
    assert_eq!(svc.state().last_contact, hw.now);
}

#[test]
fn mode_changes_append_records() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);

    // Start -> SelfTest wrote record 0, SelfTest -> Disarmed record 1.
    let record = svc.state().to_record();
    assert_eq!(record.sequence, 1);
    assert_eq!(record.boat_mode, BoatMode::Disarmed);
    assert!(svc.save_record());
}

#[test]
fn restart_restores_last_record() {
    let root = std::env::temp_dir().join(format!("hackerboat-restart-{}", std::process::id()));
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    {
        let store = FileStore::new(&root).unwrap();
        let mut svc = BoatService::new(BoatConfig::default(), Box::new(store));
        boot(&mut svc, &mut hw, &mut sink);
        svc.state_mut().launch_point = HOME;
        assert!(svc.save_record());
    }

    let store = FileStore::new(&root).unwrap();
    let mut svc = BoatService::new(BoatConfig::default(), Box::new(store));
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.boat_mode(), BoatMode::SelfTest);
    assert_eq!(svc.state().launch_point, HOME);
    // Self-test knows what the boat was doing before the restart.
    let machine = svc.machine().unwrap();
    assert_eq!(machine.current().last_mode(), BoatMode::Disarmed);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn storage_failure_does_not_stop_the_boat() {
    let mut svc = BoatService::new(BoatConfig::default(), Box::new(FailingStore));
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);
    assert!(!svc.save_record());
    assert_eq!(svc.state().fault_count(), 0);
}

#[test]
fn telemetry_snapshot() {
    let mut svc = service();
    let mut hw = MockBoat::healthy();
    let mut sink = RecordingSink::default();
    boot(&mut svc, &mut hw, &mut sink);
    hw.set_heading(45.0);
    svc.tick(&mut hw, &mut sink);

    let t = svc.build_telemetry(&hw);
    assert_eq!(t.boat_mode, BoatMode::Disarmed);
    assert_eq!(t.fix, HOME);
    assert_eq!(t.battery_v, 12.6);
    assert_eq!(t.faults, "");
    assert_eq!(t.throttle, 0);
    assert_eq!(t.uptime_ms, hw.now.as_millis() as u64);
    assert_eq!(t.relays.len(), hw.config.relays.len());
    assert!(t.relays.iter().all(|(_, r)| !r.drive));
}
