use core::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// A point on the Earth's surface in decimal degrees.
///
/// The default location is invalid (both coordinates NaN) so that an
/// unset launch point or an empty fix can never be steered to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            lat: f64::NAN,
            lon: f64::NAN,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.lat, self.lon)
    }
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within the geographic ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Initial great-circle bearing to `other`, degrees in `[0, 360)`.
    pub fn bearing(&self, other: &Location) -> f64 {
        let lat_from = self.lat.to_radians();
        let lat_to = other.lat.to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let y = delta_lon.sin() * lat_to.cos();
        let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * delta_lon.cos();

        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Haversine distance to `other` in metres.
    pub fn distance(&self, other: &Location) -> f64 {
        let lat_from = self.lat.to_radians();
        let lat_to = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }

    /// Point reached by travelling `distance` metres on `bearing` degrees.
    pub fn project(&self, bearing: f64, distance: f64) -> Location {
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let brng = bearing.to_radians();
        let angular = distance / EARTH_RADIUS;

        let lat2 =
            (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * brng.cos()).asin();
        let lon2 = lon1
            + (brng.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        Location::new(
            lat2.to_degrees(),
            (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
        )
    }
}
