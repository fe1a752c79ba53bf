use serde::{Deserialize, Serialize};

/// Wrap an angle into `[0, 360)`.
pub fn normalize_heading(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

/// Vessel attitude as reported by the IMU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    /// Degrees clockwise from north.
    pub heading: f64,
    /// `heading` is relative to magnetic rather than true north.
    pub magnetic: bool,
}

impl Orientation {
    pub fn new(roll: f64, pitch: f64, heading: f64, magnetic: bool) -> Self {
        Self {
            roll,
            pitch,
            heading,
            magnetic,
        }
    }

    /// Signed turn from the current heading to `target`, in `(-180, 180]`.
    pub fn heading_error(&self, target: f64) -> f64 {
        let error = normalize_heading(target - self.heading);
        if error > 180.0 { error - 360.0 } else { error }
    }

    /// Same attitude referenced to true north.
    pub fn make_true(&self, declination: f64) -> Self {
        if !self.magnetic {
            return *self;
        }
        Self {
            heading: normalize_heading(self.heading + declination),
            magnetic: false,
            ..*self
        }
    }

    /// Same attitude referenced to magnetic north.
    pub fn make_mag(&self, declination: f64) -> Self {
        if self.magnetic {
            return *self;
        }
        Self {
            heading: normalize_heading(self.heading - declination),
            magnetic: true,
            ..*self
        }
    }
}
