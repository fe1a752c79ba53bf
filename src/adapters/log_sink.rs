//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured events to the `log`
//! facade.  An MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::BoatEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BoatEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BoatEvent) {
        match event {
            BoatEvent::Telemetry(t) => {
                info!(
                    "TELEM | {}/{}/{}/{} | fix={} hdg={:.1}\u{00b0} | \
                     thr={} rud={:.1} | wp={}/{} | batt={:.2}V | relays={} | faults=[{}]",
                    t.boat_mode,
                    t.nav_mode,
                    t.rc_mode,
                    t.auto_mode,
                    t.fix,
                    t.heading,
                    t.throttle,
                    t.rudder,
                    t.current_waypoint,
                    t.waypoint_count,
                    t.battery_v,
                    t.relays.iter().filter(|(_, r)| r.drive).count(),
                    t.faults,
                );
            }
            BoatEvent::BoatModeChanged { from, to } => {
                info!("BOAT | {from} -> {to}");
            }
            BoatEvent::NavModeChanged { from, to } => {
                info!("NAV | {from} -> {to}");
            }
            BoatEvent::FaultDetected(faults) => {
                warn!("FAULT | active=[{faults}]");
            }
            BoatEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            BoatEvent::Started(mode) => {
                info!("START | initial_mode={mode}");
            }
        }
    }
}
