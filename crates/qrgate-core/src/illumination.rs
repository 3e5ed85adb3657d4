//! Torch control for the active camera track.

use serde::{Deserialize, Serialize};

use crate::platform::{PlatformError, PlatformFuture, VideoTrack};

/// Capabilities of a video track that the scanner cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCapabilities {
    pub torch: bool,
}

/// Torch state as tracked by the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IlluminationState {
    pub on: bool,
    pub available: bool,
}

/// Result of asking the controller to flip the torch.
pub enum ToggleStep {
    /// No track, control disabled, or a change already in flight.
    Ignored,
    /// The track cannot drive a torch; the control is now disabled.
    Unavailable,
    /// Apply `request`, then report back with `target`.
    Apply {
        target: bool,
        request: PlatformFuture,
    },
}

impl std::fmt::Debug for ToggleStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToggleStep::Ignored => f.write_str("Ignored"),
            ToggleStep::Unavailable => f.write_str("Unavailable"),
            ToggleStep::Apply { target, .. } => {
                f.debug_struct("Apply").field("target", target).finish()
            }
        }
    }
}

/// Owns [`IlluminationState`] and the enabled flag of the torch control.
///
/// The control can only be re-enabled by probing a fresh track; any failure
/// disables it for the rest of the session.
#[derive(Debug, Default)]
pub struct IlluminationController {
    state: IlluminationState,
    enabled: bool,
    in_flight: bool,
}

impl IlluminationController {
    pub fn state(&self) -> IlluminationState {
        self.state
    }

    pub fn control_enabled(&self) -> bool {
        self.enabled
    }

    /// Read torch support from a freshly acquired track.
    pub fn probe<T: VideoTrack>(&mut self, track: &T) -> bool {
        let available = torch_supported(track);
        log::info!(
            "torch capability: {}",
            if available { "available" } else { "not available" }
        );
        self.state = IlluminationState {
            on: false,
            available,
        };
        self.enabled = available;
        self.in_flight = false;
        available
    }

    /// Back to (off, unsupported) with the control disabled.
    pub fn reset(&mut self) {
        self.state = IlluminationState::default();
        self.enabled = false;
        self.in_flight = false;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Start flipping the torch on `track`.
    pub fn begin_toggle<T: VideoTrack>(&mut self, track: Option<&T>) -> ToggleStep {
        let Some(track) = track else {
            return ToggleStep::Ignored;
        };
        if !self.enabled || self.in_flight {
            return ToggleStep::Ignored;
        }

        if !torch_supported(track) {
            self.state.available = false;
            self.disable();
            return ToggleStep::Unavailable;
        }

        let target = !self.state.on;
        match track.apply_torch(target) {
            Some(request) => {
                self.in_flight = true;
                ToggleStep::Apply { target, request }
            }
            None => {
                log::warn!("track cannot apply constraints; disabling torch control");
                self.state.available = false;
                self.disable();
                ToggleStep::Unavailable
            }
        }
    }

    /// Record the outcome of a torch request. Returns `true` if applied.
    pub fn finish_toggle(&mut self, target: bool, result: Result<(), PlatformError>) -> bool {
        self.in_flight = false;
        match result {
            Ok(()) => {
                self.state.on = target;
                true
            }
            Err(err) => {
                log::error!("flash control error: {err}");
                self.disable();
                false
            }
        }
    }
}

fn torch_supported<T: VideoTrack>(track: &T) -> bool {
    match track.capabilities() {
        Ok(Some(caps)) => caps.torch,
        Ok(None) => false,
        Err(err) => {
            log::error!("error checking torch capability: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone)]
    struct Track {
        caps: Result<Option<TrackCapabilities>, PlatformError>,
        can_apply: bool,
        applied: Rc<Cell<Option<bool>>>,
    }

    impl Track {
        fn with_torch() -> Self {
            Self {
                caps: Ok(Some(TrackCapabilities { torch: true })),
                can_apply: true,
                applied: Rc::new(Cell::new(None)),
            }
        }
    }

    impl VideoTrack for Track {
        fn label(&self) -> String {
            "rear".into()
        }
        fn capabilities(&self) -> Result<Option<TrackCapabilities>, PlatformError> {
            self.caps.clone()
        }
        fn apply_torch(&self, on: bool) -> Option<PlatformFuture> {
            if !self.can_apply {
                return None;
            }
            self.applied.set(Some(on));
            Some(Box::pin(async { Ok::<(), PlatformError>(()) }))
        }
        fn stop(&self) {}
    }

    #[test]
    fn toggle_without_track_is_ignored() {
        let mut ctl = IlluminationController::default();
        let step = ctl.begin_toggle::<Track>(None);
        assert!(matches!(step, ToggleStep::Ignored));
        assert_eq!(ctl.state(), IlluminationState::default());
    }

    #[test]
    fn probe_enables_control_only_with_torch() {
        let mut ctl = IlluminationController::default();
        assert!(ctl.probe(&Track::with_torch()));
        assert!(ctl.control_enabled());

        let mut no_caps = Track::with_torch();
        no_caps.caps = Ok(None);
        assert!(!ctl.probe(&no_caps));
        assert!(!ctl.control_enabled());

        let mut broken = Track::with_torch();
        broken.caps = Err(PlatformError::rejected("TypeError", "boom"));
        assert!(!ctl.probe(&broken));
    }

    #[test]
    fn toggle_flips_state_after_request_resolves() {
        let track = Track::with_torch();
        let mut ctl = IlluminationController::default();
        ctl.probe(&track);

        let ToggleStep::Apply { target, request } = ctl.begin_toggle(Some(&track)) else {
            panic!("expected an apply step");
        };
        assert!(target);
        assert_eq!(track.applied.get(), Some(true));
        assert!(matches!(ctl.begin_toggle(Some(&track)), ToggleStep::Ignored));

        assert!(ctl.finish_toggle(target, block_on(request)));
        assert!(ctl.state().on);
    }

    #[test]
    fn failed_request_disables_control() {
        let track = Track::with_torch();
        let mut ctl = IlluminationController::default();
        ctl.probe(&track);
        let ToggleStep::Apply { target, .. } = ctl.begin_toggle(Some(&track)) else {
            panic!("expected an apply step");
        };
        let applied = ctl.finish_toggle(
            target,
            Err(PlatformError::rejected("OverconstrainedError", "torch")),
        );
        assert!(!applied);
        assert!(!ctl.state().on);
        assert!(!ctl.control_enabled());
        assert!(matches!(ctl.begin_toggle(Some(&track)), ToggleStep::Ignored));
    }

    #[test]
    fn missing_apply_constraints_is_unavailable() {
        let mut track = Track::with_torch();
        track.can_apply = false;
        let mut ctl = IlluminationController::default();
        ctl.probe(&track);
        assert!(matches!(ctl.begin_toggle(Some(&track)), ToggleStep::Unavailable));
        assert!(!ctl.control_enabled());
    }
}
