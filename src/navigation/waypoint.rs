use log::info;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use super::location::Location;

/// What the boat does after reaching the last waypoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum WaypointAction {
    Idle,
    Anchor,
    Return,
    Repeat,
    #[default]
    None,
}

/// Ordered route plus the end-of-route policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waypoints {
    points: Vec<Location>,
    current: usize,
    action: WaypointAction,
}

impl Waypoints {
    pub fn new(points: Vec<Location>, action: WaypointAction) -> Self {
        Self {
            points,
            current: 0,
            action,
        }
    }

    /// Replace the route and restart it from the first point.
    pub fn load(&mut self, points: Vec<Location>) {
        info!("Loaded {} waypoints", points.len());
        self.points = points;
        self.current = 0;
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Location] {
        &self.points
    }

    /// Index of the waypoint currently being steered to.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The waypoint currently being steered to.
    pub fn waypoint(&self) -> Option<Location> {
        self.points.get(self.current).copied()
    }

    /// Jump to `index`, clamped to the route.  Returns false on an empty route.
    pub fn set_current(&mut self, index: i64) -> bool {
        if self.points.is_empty() {
            self.current = 0;
            return false;
        }
        let last = self.points.len() - 1;
        self.current = usize::try_from(index.max(0)).map_or(last, |i| i.min(last));
        info!("Setting current waypoint to {}", self.current);
        true
    }

    /// Advance to the next waypoint.
    ///
    /// At the end of the route a `Repeat` action wraps to the first point;
    /// any other action leaves the index alone and returns false.
    pub fn increment(&mut self) -> bool {
        if self.points.is_empty() {
            return false;
        }
        if self.current + 1 < self.points.len() {
            self.current += 1;
        } else if self.action == WaypointAction::Repeat {
            self.current = 0;
        } else {
            return false;
        }
        info!("Setting current waypoint to {}", self.current);
        true
    }

    pub fn action(&self) -> WaypointAction {
        self.action
    }

    pub fn set_action(&mut self, action: WaypointAction) {
        self.action = action;
    }
}
