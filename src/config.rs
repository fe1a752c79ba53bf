//! System configuration parameters
//!
//! All tunable parameters for the boat control core.
//! Values can be overridden from a JSON file through [`ConfigPort`](crate::app::ports::ConfigPort);
//! any field missing from the file keeps its default.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::pid::Gains;

/// Relay pulsed to drop the motor driver's safety relay.
pub const RELAY_DISARM: &str = "DISARM";
/// Relay pulsed to close the motor driver's safety relay.
pub const RELAY_ENABLE: &str = "ENABLE";
/// Relay driving the arming horn.
pub const RELAY_HORN: &str = "HORN";

/// RC receiver limits and channel assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcConfig {
    /// Lowest raw channel value the receiver reports.
    pub min: i32,
    /// Highest raw channel value the receiver reports.
    pub max: i32,
    /// Raw value of a centred stick or switch.
    pub middle: i32,
    /// Half-width of the band around `middle` classified as "centre".
    pub middle_tol: i32,
    pub channel_count: usize,

    // --- Channel map ---
    pub throttle_channel: usize,
    pub rudder_channel: usize,
    pub auto_channel: usize,
    pub mode_channel: usize,
    pub course_channel: usize,
    pub horn_channel: usize,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            min: 171,
            max: 1811,
            middle: 991,
            middle_tol: 200,
            channel_count: 18,

            throttle_channel: 0,
            rudder_channel: 3,
            auto_channel: 4,
            mode_channel: 5,
            course_channel: 6,
            horn_channel: 7,
        }
    }
}

impl RcConfig {
    /// Linearly map a raw channel reading onto `[out_min, out_max]`.
    pub fn scale(&self, raw: i32, out_min: f64, out_max: f64) -> f64 {
        let span = f64::from(self.max - self.min);
        if span == 0.0 {
            return out_min;
        }
        f64::from(raw - self.min) * (out_max - out_min) / span + out_min
    }

    /// True if `raw` sits below the centre band.
    pub fn is_low(&self, raw: i32) -> bool {
        raw < self.middle - self.middle_tol
    }

    /// True if `raw` sits above the centre band.
    pub fn is_high(&self, raw: i32) -> bool {
        raw > self.middle + self.middle_tol
    }
}

/// Core boat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    // --- Timing ---
    /// Control loop period (milliseconds)
    pub frame_period_ms: u64,
    /// Helm PID sample period (milliseconds)
    pub rudder_period_ms: u64,
    /// Time the vessel spends in self-test before it may arm (milliseconds)
    pub self_test_delay_ms: u64,
    /// Arming horn duration (milliseconds)
    pub horn_time_ms: u64,
    /// Width of the ENABLE/DISARM relay pulse (milliseconds)
    pub relay_pulse_ms: u64,

    // --- Helm limits ---
    pub throttle_min: i32,
    pub throttle_max: i32,
    pub rudder_min: f64,
    pub rudder_max: f64,
    pub course_min: f64,
    pub course_max: f64,
    /// Rudder servo is mounted so that positive commands turn to port.
    pub rudder_reverse: bool,
    /// Helm PID gains loaded at startup
    pub gains: Gains,

    // --- Autonomous navigation ---
    /// Throttle used while steering to a waypoint or home
    pub auto_default_throttle: i32,
    /// Distance (metres) at which a waypoint counts as reached
    pub waypoint_tolerance_m: f64,
    /// Radius (metres) inside which Anchor mode makes no correction
    pub anchor_deadband_m: f64,
    /// Throttle steps per metre of anchor drift
    pub anchor_throttle_gain: f64,
    /// Local magnetic declination (degrees, east positive)
    pub magnetic_declination: f64,

    // --- Power ---
    /// Battery voltage required to pass self-test
    pub start_battery_min: f64,
    /// Battery voltage below which the boat drops into LowBattery
    pub low_battery_cutoff: f64,
    /// Recovery margin above the cutoff before LowBattery releases
    pub low_battery_hysteresis: f64,
    /// ADC channel name carrying the battery voltage
    pub battery_channel: String,

    // --- Hardware ---
    pub rc: RcConfig,
    /// Relays checked during self-test
    pub relays: Vec<String>,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            // Timing
            frame_period_ms: 100, // 10 Hz
            rudder_period_ms: 100,
            self_test_delay_ms: 30_000,
            horn_time_ms: 2_000,
            relay_pulse_ms: 50,

            // Helm limits
            throttle_min: -5,
            throttle_max: 5,
            rudder_min: -100.0,
            rudder_max: 100.0,
            course_min: 0.0,
            course_max: 360.0,
            rudder_reverse: true,
            gains: Gains::new(10.0, 0.1, 0.0),

            // Autonomous navigation
            auto_default_throttle: 5,
            waypoint_tolerance_m: 50.0,
            anchor_deadband_m: 5.0,
            anchor_throttle_gain: 1.0,
            magnetic_declination: 0.0,

            // Power
            start_battery_min: 12.0,
            low_battery_cutoff: 10.0,
            low_battery_hysteresis: 0.5,
            battery_channel: "battery_mon".into(),

            // Hardware
            rc: RcConfig::default(),
            relays: [
                "RED", "DIR", "YLWWHT", "REDWHT", "YLW", "WHT", RELAY_DISARM, RELAY_HORN,
                RELAY_ENABLE,
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

impl BoatConfig {
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms)
    }

    pub fn self_test_delay(&self) -> Duration {
        Duration::from_millis(self.self_test_delay_ms)
    }

    pub fn horn_time(&self) -> Duration {
        Duration::from_millis(self.horn_time_ms)
    }

    /// Helm PID sample period in seconds.
    pub fn rudder_period_secs(&self) -> f64 {
        self.rudder_period_ms as f64 / 1000.0
    }

    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_period_ms == 0 || self.rudder_period_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "frame_period_ms and rudder_period_ms must be non-zero",
            ));
        }
        if self.throttle_min >= self.throttle_max {
            return Err(ConfigError::ValidationFailed(
                "throttle_min must be < throttle_max",
            ));
        }
        if self.rudder_min >= self.rudder_max {
            return Err(ConfigError::ValidationFailed(
                "rudder_min must be < rudder_max",
            ));
        }
        if self.course_min >= self.course_max {
            return Err(ConfigError::ValidationFailed(
                "course_min must be < course_max",
            ));
        }
        if self.rc.min >= self.rc.max || !(self.rc.min..=self.rc.max).contains(&self.rc.middle) {
            return Err(ConfigError::ValidationFailed(
                "rc limits must satisfy min < max and min <= middle <= max",
            ));
        }
        if self.rc.middle_tol < 0 {
            return Err(ConfigError::ValidationFailed("rc.middle_tol must be >= 0"));
        }
        let rc = &self.rc;
        let highest = rc
            .throttle_channel
            .max(rc.rudder_channel)
            .max(rc.auto_channel)
            .max(rc.mode_channel)
            .max(rc.course_channel)
            .max(rc.horn_channel);
        if highest >= rc.channel_count {
            return Err(ConfigError::ValidationFailed(
                "rc channel map points past channel_count",
            ));
        }
        if self.low_battery_cutoff > self.start_battery_min {
            return Err(ConfigError::ValidationFailed(
                "low_battery_cutoff must be <= start_battery_min",
            ));
        }
        if self.low_battery_hysteresis < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "low_battery_hysteresis must be >= 0",
            ));
        }
        if self.waypoint_tolerance_m <= 0.0 || self.anchor_deadband_m < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "waypoint_tolerance_m must be > 0 and anchor_deadband_m >= 0",
            ));
        }
        if !self.gains.is_valid() {
            return Err(ConfigError::ValidationFailed("PID gains must be non-negative"));
        }
        for name in [RELAY_DISARM, RELAY_ENABLE, RELAY_HORN] {
            if !self.relays.iter().any(|r| r == name) {
                return Err(ConfigError::ValidationFailed(
                    "relays must include DISARM, ENABLE and HORN",
                ));
            }
        }
        Ok(())
    }
}
