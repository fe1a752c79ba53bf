//! Manual steering modes.
//!
//! Active while the navigation level is in RC.  The three-way mode switch
//! on the transmitter picks the policy; a receiver failsafe overrides the
//! switch.  A switch change transitions on the tick it is seen, and the
//! new mode drives the helm from the following tick.

use crate::app::ports::BoatHardware;
use crate::control::Helm;
use crate::state::BoatState;

use super::{Mode, ModeCore, RcMode, Transition, drive_helm};

pub struct RcController {
    core: ModeCore<RcMode>,
    /// Course-hold PID, present only in `Course`.
    helm: Option<Helm>,
}

impl Mode for RcController {
    type Kind = RcMode;
    const LEVEL: &'static str = "RC";

    fn factory(state: &mut BoatState, requested: RcMode) -> Self {
        let this = match requested {
            RcMode::None => RcMode::Idle,
            m => m,
        };
        let core = ModeCore::new(this, state.rc_mode);
        state.rc_mode = this;
        let helm = (this == RcMode::Course).then(|| Helm::new(&state.config, state.k));
        Self { core, helm }
    }

    fn execute<H: BoatHardware + ?Sized>(
        &mut self,
        state: &mut BoatState,
        hw: &mut H,
    ) -> Transition<RcMode> {
        self.core.begin_tick();
        let config = &state.config;

        let (rudder, throttle) = match (self.core.mode(), self.helm.as_mut()) {
            (RcMode::Rudder, _) => (hw.rc_rudder(config), hw.rc_throttle(config)),
            (RcMode::Course, Some(helm)) => {
                helm.refresh_tunings(state.k);
                let course = hw.rc_course(config);
                let heading = hw.orientation().make_true(config.magnetic_declination);
                (helm.steer(heading.heading_error(course)), hw.rc_throttle(config))
            }
            _ => (0.0, 0),
        };
        drive_helm(state, hw, rudder, throttle);

        let switch = hw.rc_mode(&state.config);
        if switch == self.core.mode() {
            Transition::Stay
        } else {
            Transition::To(switch)
        }
    }

    fn core(&self) -> &ModeCore<RcMode> {
        &self.core
    }

    fn slot(state: &mut BoatState) -> &mut RcMode {
        &mut state.rc_mode
    }
}
