//! Autonomous steering modes.
//!
//! Every mode steers by PID on the true-heading error to a target and
//! re-reads the shared gains each tick.  The target is the current
//! waypoint, the launch point, or a point latched on entry to Anchor.

use log::{debug, info, warn};

use crate::app::ports::BoatHardware;
use crate::control::Helm;
use crate::navigation::{Location, WaypointAction};
use crate::state::BoatState;

use super::{AutoMode, Mode, ModeCore, Transition, drive_helm};

pub struct AutoController {
    core: ModeCore<AutoMode>,
    helm: Helm,
    anchor_point: Option<Location>,
}

impl AutoController {
    /// Point latched by Anchor mode on its first tick with a valid fix.
    pub fn anchor_point(&self) -> Option<Location> {
        self.anchor_point
    }

    /// Steer toward `target` from the last fix.  Returns the distance to it.
    fn steer_to<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
        target: &Location,
    ) -> f64 {
        let here = state.last_fix.fix;
        let heading = hw
            .orientation()
            .make_true(state.config.magnetic_declination);
        let rudder = self.helm.steer(heading.heading_error(here.bearing(target)));
        let throttle = state.config.auto_default_throttle;
        drive_helm(state, hw, rudder, throttle);
        here.distance(target)
    }

    /// Follow whatever the operator set in `state.auto_mode`.
    fn commanded(&self, state: &BoatState) -> Transition<AutoMode> {
        if state.auto_mode == self.core.mode() || state.auto_mode == AutoMode::None {
            Transition::Stay
        } else {
            Transition::To(state.auto_mode)
        }
    }

    fn execute_waypoint<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<AutoMode> {
        let Some(target) = state.waypoints.waypoint() else {
            warn!("Waypoint mode entered with an empty route");
            drive_helm(state, hw, 0.0, 0);
            return Transition::To(AutoMode::Idle);
        };

        let distance = self.steer_to(state, hw, &target);
        if distance < state.config.waypoint_tolerance_m && !state.waypoints.increment() {
            let action = state.waypoints.action();
            info!("Route complete, end action {action}");
            return Transition::To(match action {
                WaypointAction::Return => AutoMode::Return,
                WaypointAction::Anchor => AutoMode::Anchor,
                _ => AutoMode::Idle,
            });
        }
        self.commanded(state)
    }

    fn execute_return<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<AutoMode> {
        let home = state.launch_point;
        if !home.is_valid() {
            warn!("Return mode has no launch point; anchoring");
            return Transition::To(AutoMode::Anchor);
        }
        let distance = self.steer_to(state, hw, &home);
        if distance < state.config.waypoint_tolerance_m {
            return Transition::To(AutoMode::Anchor);
        }
        self.commanded(state)
    }

    fn execute_anchor<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<AutoMode> {
        let here = state.last_fix.fix;
        if self.anchor_point.is_none() {
            info!("Anchoring at {here}");
            self.anchor_point = Some(here);
            state.anchor_point = here;
        }
        let anchor = self.anchor_point.unwrap_or(here);

        let config = &state.config;
        let heading = hw.orientation().make_true(config.magnetic_declination);
        let heading_error = heading.heading_error(here.bearing(&anchor));
        let distance = here.distance(&anchor);

        let (input, throttle) = if distance < config.anchor_deadband_m {
            (0.0, 0)
        } else {
            let magnitude = ((distance * config.anchor_throttle_gain).round() as i32)
                .min(config.throttle_max);
            if heading_error.abs() < 90.0 {
                (heading_error, magnitude)
            } else if heading_error > 0.0 {
                // Cheaper to back up: aim the stern at the anchor.
                (heading_error - 180.0, -magnitude)
            } else {
                (heading_error + 180.0, -magnitude)
            }
        };

        let rudder = self.helm.steer(input);
        drive_helm(state, hw, rudder, throttle);
        self.commanded(state)
    }
}

impl Mode for AutoController {
    type Kind = AutoMode;
    const LEVEL: &'static str = "Auto";

    fn factory(state: &mut BoatState, requested: AutoMode) -> Self {
        let this = match requested {
            AutoMode::None => AutoMode::Idle,
            m => m,
        };
        let core = ModeCore::new(this, state.auto_mode);
        state.auto_mode = this;
        Self {
            core,
            helm: Helm::new(&state.config, state.k),
            anchor_point: None,
        }
    }

    fn execute<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<AutoMode> {
        self.core.begin_tick();
        self.helm.refresh_tunings(state.k);

        match self.core.mode() {
            AutoMode::Idle | AutoMode::None => {
                drive_helm(state, hw, 0.0, 0);
                self.commanded(state)
            }
            // Nothing to steer from until a valid fix arrives.
            _ if !state.last_fix.is_valid() => {
                debug!("{} holding: no valid fix", self.core.mode());
                drive_helm(state, hw, 0.0, 0);
                self.commanded(state)
            }
            AutoMode::Waypoint => self.execute_waypoint(state, hw),
            AutoMode::Return => self.execute_return(state, hw),
            AutoMode::Anchor => self.execute_anchor(state, hw),
        }
    }

    fn core(&self) -> &ModeCore<AutoMode> {
        &self.core
    }

    fn slot(state: &mut BoatState) -> &mut AutoMode {
        &mut state.auto_mode
    }
}
