//! Simulated vessel.
//!
//! [`SimBoat`] implements every hardware port so the control core can run
//! on a host.  A crude kinematic model moves the boat: throttle sets
//! speed, rudder sets turn rate, and the GPS fix is projected along the
//! heading each [`advance`](SimBoat::advance).
//!
//! The arm/disarm inputs and servo enable go through the same
//! [`HalInput`]/[`HalOutput`] wrappers a board would use, backed by
//! [`SimPin`]s.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::{
    Actuators, AdcInput, Clock, GpsInput, HealthMonitor, OrientationInput, PinLevel, RcInput,
    RelayMap, RelayState, SafetyInputs,
};
use crate::config::BoatConfig;
use crate::navigation::{GpsFix, Location, Orientation, normalize_heading};

use super::hal_pin::{HalInput, HalOutput, SimPin};
use super::time::{StdDelay, SystemClock};

/// Metres per second per throttle step.
const SPEED_PER_THROTTLE: f64 = 0.5;
/// Degrees per second of turn per unit of rudder.
const TURN_PER_RUDDER: f64 = 0.2;

pub struct SimBoat {
    clock: SystemClock,
    delay: StdDelay,

    pub rc_channels: Vec<i32>,
    pub rc_failsafe: bool,
    pub battery_v: f64,
    pub orientation: Orientation,
    pub fix: Location,

    relays: HashMap<String, RelayState>,
    arm: RefCell<HalInput<SimPin>>,
    disarm: RefCell<HalInput<SimPin>>,
    servo: HalOutput<SimPin>,
    servo_on: bool,

    rudder: f64,
    throttle: i32,
}

impl SimBoat {
    /// A healthy, disarmed boat at `start` with every configured relay.
    pub fn new(config: &BoatConfig, start: Location) -> Self {
        let relays = config
            .relays
            .iter()
            .map(|name| (name.clone(), RelayState::default()))
            .collect();
        Self {
            clock: SystemClock::new(),
            delay: StdDelay,

            rc_channels: vec![config.rc.middle; config.rc.channel_count],
            rc_failsafe: false,
            battery_v: 12.6,
            orientation: Orientation::new(0.0, 0.0, 0.0, false),
            fix: start,

            relays,
            arm: RefCell::new(HalInput::new("arm", SimPin::new(false))),
            disarm: RefCell::new(HalInput::new("disarm", SimPin::new(true))),
            servo: HalOutput::new("servo_enable", SimPin::new(false)),
            servo_on: false,

            rudder: 0.0,
            throttle: 0,
        }
    }

    /// Flip the physical arm switch.  The disarm input always reads the
    /// opposite level.
    pub fn set_armed(&mut self, armed: bool) {
        *self.arm.get_mut() = HalInput::new("arm", SimPin::new(armed));
        *self.disarm.get_mut() = HalInput::new("disarm", SimPin::new(!armed));
    }

    /// Move the boat forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        let secs = dt.as_secs_f64();
        if !self.servo_on {
            return;
        }
        let speed = f64::from(self.throttle) * SPEED_PER_THROTTLE;
        if speed != 0.0 {
            let turn = self.rudder * TURN_PER_RUDDER * secs * speed.signum();
            self.orientation.heading = normalize_heading(self.orientation.heading + turn);
        }
        self.fix = self.fix.project(self.orientation.heading, speed * secs);
        debug!(
            "sim: fix={} hdg={:.1} thr={} rud={:.1}",
            self.fix, self.orientation.heading, self.throttle, self.rudder
        );
    }
}

impl RcInput for SimBoat {
    fn rc_channel(&self, index: usize) -> i32 {
        self.rc_channels.get(index).copied().unwrap_or_default()
    }

    fn rc_failsafe(&self) -> bool {
        self.rc_failsafe
    }

    fn rc_valid(&self) -> bool {
        !self.rc_channels.is_empty()
    }
}

impl AdcInput for SimBoat {
    fn adc_valid(&self) -> bool {
        true
    }

    fn adc_values(&self) -> HashMap<String, f64> {
        HashMap::from([("battery_mon".to_string(), self.battery_v)])
    }
}

impl OrientationInput for SimBoat {
    fn orientation_valid(&self) -> bool {
        true
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl GpsInput for SimBoat {
    fn gps_valid(&self) -> bool {
        self.fix.is_valid()
    }

    fn gps_fix(&self) -> GpsFix {
        let speed = f64::from(self.throttle) * SPEED_PER_THROTTLE;
        GpsFix::new(self.fix, self.orientation.heading, speed.abs())
    }
}

impl HealthMonitor for SimBoat {
    fn health_valid(&self) -> bool {
        true
    }

    fn battery_mon(&self) -> f64 {
        self.battery_v
    }
}

impl RelayMap for SimBoat {
    fn relay_set(&mut self, name: &str) -> bool {
        match self.relays.get_mut(name) {
            Some(r) => {
                r.drive = true;
                true
            }
            None => {
                warn!("sim: unknown relay {name}");
                false
            }
        }
    }

    fn relay_clear(&mut self, name: &str) -> bool {
        match self.relays.get_mut(name) {
            Some(r) => {
                r.drive = false;
                true
            }
            None => false,
        }
    }

    fn relay_faulted(&self, name: &str) -> bool {
        self.relays.get(name).is_none_or(|r| r.fault)
    }

    fn relay_initialized(&self, name: &str) -> bool {
        self.relays.contains_key(name)
    }

    fn relay_state(&self, name: &str) -> Option<RelayState> {
        self.relays.get(name).copied()
    }
}

impl SafetyInputs for SimBoat {
    fn disarm_input(&self) -> PinLevel {
        self.disarm.borrow_mut().level()
    }

    fn arm_input(&self) -> PinLevel {
        self.arm.borrow_mut().level()
    }

    fn servo_enable_set(&mut self) -> bool {
        self.servo_on = self.servo.set();
        self.servo_on
    }

    fn servo_enable_clear(&mut self) -> bool {
        let ok = self.servo.clear();
        self.servo_on = !ok;
        ok
    }
}

impl Actuators for SimBoat {
    fn rudder_write(&mut self, angle: f64) -> bool {
        if !angle.is_finite() {
            return false;
        }
        self.rudder = angle;
        true
    }

    fn rudder_read(&self) -> f64 {
        self.rudder
    }

    fn throttle_set(&mut self, throttle: i32) -> bool {
        self.throttle = throttle;
        true
    }

    fn throttle_get(&self) -> i32 {
        self.throttle
    }
}

impl Clock for SimBoat {
    fn now(&self) -> Duration {
        self.clock.now()
    }
}

impl DelayNs for SimBoat {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }
}
