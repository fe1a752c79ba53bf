//! Navigation primitives: positions, attitude, GPS fixes and routes.

pub mod gps;
pub mod location;
pub mod orientation;
pub mod waypoint;

pub use gps::GpsFix;
pub use location::Location;
pub use orientation::{Orientation, normalize_heading};
pub use waypoint::{WaypointAction, Waypoints};
