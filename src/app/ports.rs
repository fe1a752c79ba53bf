//! Port traits: the boundary between the mode hierarchy and the vessel.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BoatService / mode machines
//! ```
//!
//! Sensor threads, relay drivers, storage and event sinks implement these
//! traits.  Every mode's `execute` is generic over [`BoatHardware`], the
//! union of the collaborator ports, so the mode logic never touches
//! hardware directly and tests can drive it with a single mock.
//!
//! ## Threading notes
//!
//! - Read accessors return value snapshots.  Implementations backed by a
//!   sensor thread lock only inside the call and never block on I/O.
//! - A stale or invalid snapshot is reported through `*_valid()`, not by
//!   waiting.

use std::collections::HashMap;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::config::BoatConfig;
use crate::fsm::{NavMode, RcMode};
use crate::navigation::{GpsFix, Orientation};

// ───────────────────────────────────────────────────────────────
// RC receiver
// ───────────────────────────────────────────────────────────────

/// Radio-control receiver.
///
/// Only the raw channel accessors are required; scaling and switch
/// classification are derived from [`BoatConfig`].
pub trait RcInput {
    /// Raw value of channel `index`.  Out-of-range channels read 0.
    fn rc_channel(&self, index: usize) -> i32;

    /// The receiver has lost its transmitter link.
    fn rc_failsafe(&self) -> bool;

    /// The receiver is producing frames.
    fn rc_valid(&self) -> bool;

    /// Throttle stick mapped onto `[throttle_min, throttle_max]`.
    fn rc_throttle(&self, config: &BoatConfig) -> i32 {
        let raw = self.rc_channel(config.rc.throttle_channel);
        config
            .rc
            .scale(
                raw,
                f64::from(config.throttle_min),
                f64::from(config.throttle_max),
            )
            .round() as i32
    }

    /// Rudder stick mapped onto `[rudder_min, rudder_max]`.
    fn rc_rudder(&self, config: &BoatConfig) -> f64 {
        let raw = self.rc_channel(config.rc.rudder_channel);
        config.rc.scale(raw, config.rudder_min, config.rudder_max)
    }

    /// Course selector mapped onto `[course_min, course_max]`.
    fn rc_course(&self, config: &BoatConfig) -> f64 {
        let raw = self.rc_channel(config.rc.course_channel);
        config.rc.scale(raw, config.course_min, config.course_max)
    }

    /// Three-way mode switch.  Failsafe overrides the switch position.
    fn rc_mode(&self, config: &BoatConfig) -> RcMode {
        if self.rc_failsafe() {
            return RcMode::Failsafe;
        }
        let raw = self.rc_channel(config.rc.mode_channel);
        if config.rc.is_low(raw) {
            RcMode::Rudder
        } else if config.rc.is_high(raw) {
            RcMode::Course
        } else {
            RcMode::Idle
        }
    }

    /// RC/autonomous switch.  `None` when centred or when the link is down.
    fn rc_auto_switch(&self, config: &BoatConfig) -> Option<NavMode> {
        if self.rc_failsafe() || !self.rc_valid() {
            return None;
        }
        let raw = self.rc_channel(config.rc.auto_channel);
        if config.rc.is_high(raw) {
            Some(NavMode::Rc)
        } else if config.rc.is_low(raw) {
            Some(NavMode::Autonomous)
        } else {
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Analog, attitude, position and power sensors
// ───────────────────────────────────────────────────────────────

pub trait AdcInput {
    fn adc_valid(&self) -> bool;

    /// Scaled readings keyed by channel name.
    fn adc_values(&self) -> HashMap<String, f64>;
}

pub trait OrientationInput {
    fn orientation_valid(&self) -> bool;

    fn orientation(&self) -> Orientation;
}

pub trait GpsInput {
    fn gps_valid(&self) -> bool;

    fn gps_fix(&self) -> GpsFix;
}

pub trait HealthMonitor {
    fn health_valid(&self) -> bool;

    /// Battery voltage.
    fn battery_mon(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Relays
// ───────────────────────────────────────────────────────────────

/// Logical state of one relay, read fresh from hardware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelayState {
    pub current_amps: f64,
    pub drive: bool,
    pub fault: bool,
}

/// Named relay bank.  Unknown names fail rather than panic.
pub trait RelayMap {
    fn relay_set(&mut self, name: &str) -> bool;

    fn relay_clear(&mut self, name: &str) -> bool;

    fn relay_faulted(&self, name: &str) -> bool;

    fn relay_initialized(&self, name: &str) -> bool;

    /// Snapshot for telemetry; `None` for unknown names.
    fn relay_state(&self, name: &str) -> Option<RelayState>;
}

// ───────────────────────────────────────────────────────────────
// Safety interlock pins
// ───────────────────────────────────────────────────────────────

/// Reading of a digital safety input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
    /// The pin could not be read.
    Error,
}

impl PinLevel {
    pub fn is_high(self) -> bool {
        self == Self::High
    }
}

/// Arm/disarm inputs and the servo power enable.
pub trait SafetyInputs {
    fn disarm_input(&self) -> PinLevel;

    fn arm_input(&self) -> PinLevel;

    fn servo_enable_set(&mut self) -> bool;

    fn servo_enable_clear(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Helm actuators
// ───────────────────────────────────────────────────────────────

pub trait Actuators {
    fn rudder_write(&mut self, angle: f64) -> bool;

    fn rudder_read(&self) -> f64;

    fn throttle_set(&mut self, throttle: i32) -> bool;

    fn throttle_get(&self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic clock.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Everything a mode needs from the vessel.
///
/// Relay pulses are short blocking sleeps, hence [`DelayNs`].
pub trait BoatHardware:
    RcInput
    + AdcInput
    + OrientationInput
    + GpsInput
    + HealthMonitor
    + RelayMap
    + SafetyInputs
    + Actuators
    + Clock
    + DelayNs
{
}

impl<T> BoatHardware for T where
    T: RcInput
        + AdcInput
        + OrientationInput
        + GpsInput
        + HealthMonitor
        + RelayMap
        + SafetyInputs
        + Actuators
        + Clock
        + DelayNs
        + ?Sized
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`BoatEvent`](super::events::BoatEvent)s
/// through this port.  Adapters decide where they go (log, MQTT, ...).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BoatEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`BoatConfig`].
///
/// Implementations MUST call [`BoatConfig::validate`] before persisting
/// and after loading.  Invalid values are rejected with
/// [`ConfigError::ValidationFailed`], never silently clamped.
pub trait ConfigPort {
    /// Returns [`BoatConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<BoatConfig, ConfigError>;

    fn save(&self, config: &BoatConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value byte storage for persisted state records.
///
/// Writes MUST be atomic: a reader sees either the old or the new value.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file found.
    NotFound,
    /// Stored config could not be parsed.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the backing file.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Value does not fit the caller's buffer or the backing store.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
