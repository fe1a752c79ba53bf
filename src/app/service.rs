//! Boat service, the hexagonal core.
//!
//! [`BoatService`] owns the [`BoatState`] and the top of the mode
//! hierarchy.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  RcInput · GpsInput ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  SafetyInputs · ...     │      BoatService        │
//!  Actuators · RelayMap ◀─│  Boat ▸ Nav ▸ RC/Auto   │ ◀── CommandSender
//!                         └────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::BoatConfig;
use crate::fsm::{BoatMachine, BoatMode, NavMode};
use crate::state::BoatState;

use super::commands::CommandSender;
use super::events::{BoatEvent, TelemetryData};
use super::ports::{BoatHardware, EventSink, StoragePort};

// ───────────────────────────────────────────────────────────────
// BoatService
// ───────────────────────────────────────────────────────────────

pub struct BoatService {
    state: BoatState,
    machine: Option<BoatMachine>,
    tick_count: u64,
}

impl BoatService {
    /// Construct the service.  Does **not** start the mode machine; call
    /// [`start`](Self::start) next.
    pub fn new(config: BoatConfig, store: Box<dyn StoragePort>) -> Self {
        Self {
            state: BoatState::new(config, store),
            machine: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Start`.  The first tick restores the last record and moves
    /// on to self-test.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        let machine = BoatMachine::new(&mut self.state, BoatMode::Start);
        let mode = machine.mode();
        self.machine = Some(machine);
        sink.emit(&BoatEvent::Started(mode));
        info!("BoatService started in {mode}");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control frame: stamp time, refresh the navigation
    /// snapshot, step the mode hierarchy and report what changed.
    pub fn tick<H: BoatHardware + ?Sized>(&mut self, hw: &mut H, sink: &mut impl EventSink) {
        if self.machine.is_none() {
            warn!("tick before start; starting now");
            self.start(sink);
        }
        self.tick_count += 1;

        // 1. Frame time and sensor snapshot
        let now = hw.now();
        self.state.record_time = now;
        if hw.gps_valid() {
            let fix = hw.gps_fix();
            if fix.is_valid() {
                self.state.last_fix = fix;
            }
        }
        if hw.orientation_valid() {
            self.state.orientation = hw.orientation();
        }
        if hw.rc_valid() && !hw.rc_failsafe() {
            self.state.last_rc = now;
        }

        let Some(machine) = self.machine.as_mut() else {
            return;
        };
        let prev_nav = machine.current().nav_mode().unwrap_or(NavMode::None);
        let prev_faults = self.state.faults.clone();

        // 2. Mode hierarchy
        let boat_change = machine.step(&mut self.state, hw);
        let nav = machine.current().nav_mode().unwrap_or(NavMode::None);

        // 3. Events and persistence
        if let Some((from, to)) = boat_change {
            sink.emit(&BoatEvent::BoatModeChanged { from, to });
            self.state.append_record();
        }
        if nav != prev_nav {
            sink.emit(&BoatEvent::NavModeChanged {
                from: prev_nav,
                to: nav,
            });
        }
        let faults = &self.state.faults;
        if faults.iter().any(|f| !prev_faults.contains(f)) {
            sink.emit(&BoatEvent::FaultDetected(faults.as_str().to_string()));
        } else if faults.is_empty() && !prev_faults.is_empty() {
            sink.emit(&BoatEvent::FaultCleared);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the state and live hardware.
    pub fn build_telemetry<H: BoatHardware + ?Sized>(&self, hw: &H) -> TelemetryData {
        let s = &self.state;
        TelemetryData {
            uptime_ms: hw.now().as_millis() as u64,
            boat_mode: s.boat_mode,
            nav_mode: s.nav_mode,
            rc_mode: s.rc_mode,
            auto_mode: s.auto_mode,
            faults: s.fault_string().to_string(),
            battery_v: hw.battery_mon(),
            fix: s.last_fix.fix,
            heading: s
                .orientation
                .make_true(s.config.magnetic_declination)
                .heading,
            throttle: hw.throttle_get(),
            rudder: hw.rudder_read(),
            current_waypoint: s.waypoints.current(),
            waypoint_count: s.waypoints.count(),
            last_contact_ms: s.last_contact.as_millis() as u64,
            relays: s
                .config
                .relays
                .iter()
                .filter_map(|name| hw.relay_state(name).map(|r| (name.clone(), r)))
                .collect(),
        }
    }

    /// Live boat mode (`None` before [`start`](Self::start)).
    pub fn boat_mode(&self) -> BoatMode {
        self.machine
            .as_ref()
            .map_or(BoatMode::None, BoatMachine::mode)
    }

    /// Live nav mode, if in Navigation.
    pub fn nav_mode(&self) -> Option<NavMode> {
        self.machine.as_ref()?.current().nav_mode()
    }

    pub fn machine(&self) -> Option<&BoatMachine> {
        self.machine.as_ref()
    }

    pub fn state(&self) -> &BoatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BoatState {
        &mut self.state
    }

    /// Handle for interface threads that enqueue operator commands.
    pub fn command_sender(&self) -> CommandSender {
        self.state.command_sender()
    }

    /// Control frames executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Overwrite the newest record with the current state.
    pub fn save_record(&mut self) -> bool {
        self.state.write_record()
    }
}
