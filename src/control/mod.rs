//! Closed-loop helm control.
//!
//! Every steering mode (RC course-hold and all autonomous modes) owns a
//! [`Helm`].  The gains live in one place, `BoatState::k`, so each helm
//! pulls them every tick and only re-tunes its PID when they changed.

pub mod pid;

use log::debug;

use crate::config::BoatConfig;
use pid::{Direction, Gains, PidController};

/// Heading-error to rudder-angle controller.
pub struct Helm {
    pid: PidController,
    sample_secs: f64,
}

impl Helm {
    pub fn new(config: &BoatConfig, gains: Gains) -> Self {
        let mut pid = PidController::new(gains.kp, gains.ki, gains.kd, 0.0);
        pid.set_limits(config.rudder_min, config.rudder_max);
        pid.set_direction(if config.rudder_reverse {
            Direction::Reverse
        } else {
            Direction::Direct
        });
        Self {
            pid,
            sample_secs: config.rudder_period_secs(),
        }
    }

    /// Adopt `gains` if they differ from the ones in use.
    pub fn refresh_tunings(&mut self, gains: Gains) {
        if self.pid.tunings() != gains {
            debug!(
                "Helm retuned: Kp={} Ki={} Kd={}",
                gains.kp, gains.ki, gains.kd
            );
            self.pid.set_tunings(gains);
        }
    }

    pub fn tunings(&self) -> Gains {
        self.pid.tunings()
    }

    /// Rudder command that drives `heading_error` towards zero.
    pub fn steer(&mut self, heading_error: f64) -> f64 {
        self.pid.compute(heading_error, self.sample_secs)
    }
}
