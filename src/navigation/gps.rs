use serde::{Deserialize, Serialize};

use super::location::Location;

/// A single GPS position report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub fix: Location,
    /// Course over ground, degrees true.
    pub track: f64,
    /// Speed over ground, m/s.
    pub speed: f64,
    pub fix_valid: bool,
}

impl GpsFix {
    pub fn new(fix: Location, track: f64, speed: f64) -> Self {
        Self {
            fix,
            track,
            speed,
            fix_valid: fix.is_valid(),
        }
    }

    /// Reported valid and carrying usable coordinates.
    pub fn is_valid(&self) -> bool {
        self.fix_valid && self.fix.is_valid()
    }
}
