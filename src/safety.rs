//! Fault aggregation and vessel health checks.
//!
//! Faults are named strings held in a [`FaultSet`].  Every mode
//! re-evaluates the conditions it owns **each tick**: a condition that
//! is true inserts its name, a condition that is false removes it.  A
//! transient glitch therefore clears itself on the next tick without any
//! operator action.
//!
//! ## Fault lifecycle
//!
//! 1. A check fails (e.g. GPS snapshot invalid).
//! 2. The owning mode inserts the fault name and drops to a safe mode.
//! 3. Boat-level Fault keeps re-running every known check and removes
//!    each name whose condition is healthy again.
//! 4. When the set is empty, Fault hands control back.
//!
//! Several faults can be active at once; each is tracked and cleared on
//! its own.

use std::borrow::Cow;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::{BoatHardware, PinLevel};
use crate::state::BoatState;

const SEPARATOR: char = ':';

// ---------------------------------------------------------------------------
// Fault names
// ---------------------------------------------------------------------------

pub const LOW_BATTERY: &str = "Low Battery";
pub const HEALTH_INVALID: &str = "Invalid Health Monitor";
pub const RC_INVALID: &str = "RC input invalid";
pub const ADC_INVALID: &str = "ADC input invalid";
pub const GPS_INVALID: &str = "GPS input invalid";
pub const LAST_FIX_INVALID: &str = "Last GPS fix invalid";
pub const ORIENTATION_INVALID: &str = "Orientation input invalid";
pub const DISARM_INVALID: &str = "Disarm input invalid";
pub const ARM_INVALID: &str = "Arm input invalid";
pub const ARM_DISARM_MISMATCH: &str = "Arm/disarm inputs do not agree";
pub const SERVO_ENABLE_FAILED: &str = "Servo enable failed";
pub const THROTTLE_WRITE_FAILED: &str = "Throttle write failed";
pub const RUDDER_WRITE_FAILED: &str = "Rudder write failed";

pub fn relay_not_initialized(relay: &str) -> String {
    format!("Relay {relay} did not initialize")
}

pub fn relay_faulted(relay: &str) -> String {
    format!("Relay {relay} is faulted")
}

// ---------------------------------------------------------------------------
// FaultSet
// ---------------------------------------------------------------------------

/// Colon-delimited set of active fault names, in insertion order.
///
/// The set is empty exactly when the fault string is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSet {
    faults: String,
}

impl FaultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from a persisted fault string, dropping duplicates.
    pub fn from_fault_string(faults: &str) -> Self {
        let mut set = Self::new();
        for name in faults.split(SEPARATOR) {
            set.insert(name);
        }
        set
    }

    /// Add `name`.  Returns true if it was not already present.
    ///
    /// Empty names and names containing the separator are refused.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || name.contains(SEPARATOR) || self.contains(name) {
            return false;
        }
        if !self.faults.is_empty() {
            self.faults.push(SEPARATOR);
        }
        self.faults.push_str(name);
        true
    }

    /// Remove one occurrence of `name`.  Returns true if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        let mut removed = false;
        let mut rest = String::with_capacity(self.faults.len());
        for f in self.faults.split(SEPARATOR) {
            if !removed && f == name {
                removed = true;
                continue;
            }
            if !rest.is_empty() {
                rest.push(SEPARATOR);
            }
            rest.push_str(f);
        }
        self.faults = rest;
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.iter().any(|f| f == name)
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn clear(&mut self) {
        self.faults.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.faults.split(SEPARATOR).filter(|f| !f.is_empty())
    }

    /// The colon-delimited fault string.
    pub fn as_str(&self) -> &str {
        &self.faults
    }

    /// Set or clear `name` based on a boolean condition.
    pub fn eval(&mut self, name: &str, condition: bool) {
        if condition {
            if self.insert(name) {
                error!("FAULT SET: {name}");
            }
        } else if self.remove(name) {
            info!("FAULT CLEARED: {name}");
        }
    }

    /// Level-triggered evaluation of a batch of checks.
    pub fn apply(&mut self, checks: &[HealthCheck]) {
        for check in checks {
            self.eval(&check.name, check.failed);
        }
    }

    /// Clear-only evaluation: healthy checks remove their fault, failing
    /// checks leave the set untouched.
    pub fn clear_healthy(&mut self, checks: &[HealthCheck]) {
        for check in checks.iter().filter(|c| !c.failed) {
            if self.remove(&check.name) {
                info!("FAULT CLEARED: {}", check.name);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Health checks
// ---------------------------------------------------------------------------

/// One named condition, sampled now.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthCheck {
    pub name: Cow<'static, str>,
    pub failed: bool,
}

impl HealthCheck {
    pub fn new(name: impl Into<Cow<'static, str>>, failed: bool) -> Self {
        Self {
            name: name.into(),
            failed,
        }
    }
}

/// Every condition self-test gates arming on.
pub fn self_test_checks<H: BoatHardware + ?Sized>(state: &BoatState, hw: &H) -> Vec<HealthCheck> {
    let disarm = hw.disarm_input();
    let arm = hw.arm_input();

    let mut checks = vec![
        HealthCheck::new(
            LOW_BATTERY,
            hw.battery_mon() < state.config.start_battery_min,
        ),
        HealthCheck::new(HEALTH_INVALID, !hw.health_valid()),
        HealthCheck::new(RC_INVALID, !hw.rc_valid()),
        HealthCheck::new(ADC_INVALID, !hw.adc_valid()),
        HealthCheck::new(GPS_INVALID, !hw.gps_valid()),
        HealthCheck::new(LAST_FIX_INVALID, !state.last_fix.is_valid()),
        HealthCheck::new(DISARM_INVALID, disarm == PinLevel::Error),
        HealthCheck::new(ARM_INVALID, arm == PinLevel::Error),
        HealthCheck::new(ARM_DISARM_MISMATCH, disarm == arm),
    ];

    for relay in &state.config.relays {
        checks.push(HealthCheck::new(
            relay_not_initialized(relay),
            !hw.relay_initialized(relay),
        ));
        checks.push(HealthCheck::new(relay_faulted(relay), hw.relay_faulted(relay)));
    }
    checks
}

/// Sensor-validity conditions sampled by every navigation mode.
pub fn sensor_checks<H: BoatHardware + ?Sized>(hw: &H) -> Vec<HealthCheck> {
    vec![
        HealthCheck::new(ADC_INVALID, !hw.adc_valid()),
        HealthCheck::new(ORIENTATION_INVALID, !hw.orientation_valid()),
        HealthCheck::new(GPS_INVALID, !hw.gps_valid()),
    ]
}
