//! Outbound application events.
//!
//! The [`BoatService`](super::service::BoatService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, publish over
//! MQTT, or record them in a test.

use crate::app::ports::RelayState;
use crate::fsm::{AutoMode, BoatMode, NavMode, RcMode};
use crate::navigation::Location;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum BoatEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The boat-level mode changed.
    BoatModeChanged { from: BoatMode, to: BoatMode },

    /// The navigation mode changed.
    NavModeChanged { from: NavMode, to: NavMode },

    /// One or more faults were raised.  Carries the full fault string.
    FaultDetected(String),

    /// Every fault has been cleared.
    FaultCleared,

    /// The service has started (carries the initial boat mode).
    Started(BoatMode),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub uptime_ms: u64,
    pub boat_mode: BoatMode,
    pub nav_mode: NavMode,
    pub rc_mode: RcMode,
    pub auto_mode: AutoMode,
    pub faults: String,
    pub battery_v: f64,
    pub fix: Location,
    /// True heading in degrees.
    pub heading: f64,
    pub throttle: i32,
    pub rudder: f64,
    pub current_waypoint: usize,
    pub waypoint_count: usize,
    pub last_contact_ms: u64,
    /// Configured relays in bank order.  Missing relays are absent.
    pub relays: Vec<(String, RelayState)>,
}
