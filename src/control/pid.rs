//! PID controller for the rudder helm
//!
//! Proportional-integral-derivative controller with a reversible
//! direction, output limits, and live re-tuning.  Derivative acts on
//! the measurement so that a setpoint jump does not kick the rudder.

use serde::{Deserialize, Serialize};

/// PID gain tuple `(Kp, Ki, Kd)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Gains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Negative gains are never accepted; direction is set separately.
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
    }
}

/// Sense of the controller output relative to the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Output rises when the measurement is below the setpoint.
    Direct,
    /// Output falls when the measurement is below the setpoint.
    Reverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Self::Direct => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// PID controller
pub struct PidController {
    gains: Gains,
    direction: Direction,
    setpoint: f64,
    integral: f64,
    last_input: Option<f64>,
    output_min: f64,
    output_max: f64,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64, setpoint: f64) -> Self {
        Self {
            gains: Gains::new(kp, ki, kd),
            direction: Direction::Direct,
            setpoint,
            integral: 0.0,
            last_input: None,
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f64, max: f64) {
        if min >= max {
            return;
        }
        self.output_min = min;
        self.output_max = max;
        self.integral = self.integral.clamp(min, max);
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Currently applied gains.
    pub fn tunings(&self) -> Gains {
        self.gains
    }

    /// Replace the gains.  Invalid (negative or non-finite) gains are ignored.
    pub fn set_tunings(&mut self, gains: Gains) {
        if gains.is_valid() {
            self.gains = gains;
        }
    }

    /// Compute PID output given current measurement
    pub fn compute(&mut self, measurement: f64, dt: f64) -> f64 {
        let sign = self.direction.sign();
        let error = self.setpoint - measurement;

        // Proportional
        let p = sign * self.gains.kp * error;

        // Integral, clamped to the output range (anti-windup)
        self.integral = (self.integral + sign * self.gains.ki * error * dt)
            .clamp(self.output_min, self.output_max);

        // Derivative on measurement
        let d = match self.last_input {
            Some(prev) if dt > 0.0 => sign * self.gains.kd * (measurement - prev) / dt,
            _ => 0.0,
        };
        self.last_input = Some(measurement);

        (p + self.integral - d).clamp(self.output_min, self.output_max)
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_input = None;
    }
}
