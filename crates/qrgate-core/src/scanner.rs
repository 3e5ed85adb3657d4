//! Lifecycle supervisor: one scanner, one camera session at a time.
//!
//! State machine:
//!
//! ```text
//!            initialize(false)
//!   (new) ───────────────────────▶ Unsupported (terminal)
//!     │ initialize(true) + Timer::Start
//!     ▼
//!  Stopped ──begin_start──▶ Starting ──finish_playback(Ok)──▶ Running ◀─┐
//!     ▲                        │                              │  │      │
//!     │    acquire/play error, │                      reject  │  │ EndPause
//!     │    hidden              │                              ▼  │      │
//!     └────────────────────────┴──── hidden, accept ◀──── Paused ───────┘
//! ```
//!
//! The `scanning` flag is the only cancellation primitive for the frame
//! loop: it is checked before a frame is processed and before the next one is
//! requested, and at most one frame request is outstanding.

use crate::acquire::{AcquireError, Acquired};
use crate::config::ScannerConfig;
use crate::constraints::ConstraintSet;
use crate::frame::FrameSampler;
use crate::illumination::{IlluminationController, IlluminationState, ToggleStep};
use crate::platform::{
    CameraStream, Host, Navigator, Platform, PlatformError, PlatformFuture, ScannerUi,
    VideoSurface,
};
use crate::schedule::{Scheduler, Timer};
use crate::session::ScanSession;
use crate::validate::{outcome_for, ScanOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Camera acquisition is not available; nothing will ever run.
    Unsupported,
    Stopped,
    /// Acquisition or playback in flight.
    Starting,
    Running,
    /// Stream kept, frame loop suspended.
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Follow-up the host must perform after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    /// Run [`crate::driver::start`].
    Start,
}

/// A start in flight. `token` identifies it to [`Scanner::finish_acquire`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartRequest {
    pub token: u64,
    pub plan: Vec<ConstraintSet>,
}

/// Pending video playback for the session with `epoch`.
pub struct Playback {
    pub epoch: u64,
    pub request: PlatformFuture,
}

/// Pending torch change for the session with `epoch`.
pub struct TorchRequest {
    pub epoch: u64,
    pub target: bool,
    pub request: PlatformFuture,
}

pub struct Scanner<P: Platform> {
    config: ScannerConfig,
    host: Host<P>,
    sampler: FrameSampler,
    illumination: IlluminationController,
    session: Option<ScanSession<P::Stream>>,
    state: LifecycleState,
    scanning: bool,
    frame_pending: bool,
    epoch: u64,
    start_token: u64,
    pause: u64,
    pause_pending: Option<u64>,
    notice: u64,
    notice_shown: Option<u64>,
    status: String,
}

impl<P: Platform> Scanner<P> {
    pub fn new(config: ScannerConfig, host: Host<P>) -> Self {
        let sampler = FrameSampler::new(config.decode_options());
        Self {
            config,
            host,
            sampler,
            illumination: IlluminationController::default(),
            session: None,
            state: LifecycleState::Stopped,
            scanning: false,
            frame_pending: false,
            epoch: 0,
            start_token: 0,
            pause: 0,
            pause_pending: None,
            notice: 0,
            notice_shown: None,
            status: String::new(),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn host(&self) -> &Host<P> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host<P> {
        &mut self.host
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ScanSession<P::Stream>> {
        self.session.as_ref()
    }

    pub fn illumination(&self) -> IlluminationState {
        self.illumination.state()
    }

    pub fn torch_enabled(&self) -> bool {
        self.illumination.control_enabled()
    }

    /// Text currently shown on the status surface.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Capability gate.
    ///
    /// Without camera support the scanner becomes permanently
    /// [`LifecycleState::Unsupported`]. Otherwise a deferred start is
    /// scheduled. Returns whether the pipeline may run.
    pub fn initialize(&mut self, camera_supported: bool) -> bool {
        if self.state == LifecycleState::Unsupported {
            return false;
        }
        self.host.ui.set_torch_enabled(false);
        if !camera_supported {
            log::error!("camera stream acquisition is not available");
            self.state = LifecycleState::Unsupported;
            let text = self.config.messages.unsupported.clone();
            self.set_status(&text);
            return false;
        }
        self.host
            .scheduler
            .schedule(self.config.start_delay(), Timer::Start);
        true
    }

    /// Enter `Starting` and return the constraint sets to acquire with.
    ///
    /// `None` unless the scanner is stopped. Each call supersedes any earlier
    /// start still waiting for its stream.
    pub fn begin_start(&mut self) -> Option<StartRequest> {
        if self.state != LifecycleState::Stopped {
            log::debug!("start ignored in state {:?}", self.state);
            return None;
        }
        self.state = LifecycleState::Starting;
        self.start_token += 1;
        let text = self.config.messages.accessing.clone();
        self.set_status(&text);
        Some(StartRequest {
            token: self.start_token,
            plan: self.config.constraint_plan(),
        })
    }

    /// Bind an acquired stream, or report why there is none.
    ///
    /// Results for a start that was cancelled or superseded are dropped, and
    /// their stream is stopped. Returns the video playback request to await
    /// before scanning begins.
    pub fn finish_acquire(
        &mut self,
        token: u64,
        result: Result<Acquired<P::Stream>, AcquireError>,
    ) -> Option<Playback> {
        if self.state != LifecycleState::Starting || token != self.start_token {
            match result {
                Ok(acquired) => {
                    log::info!("start {token} was cancelled; releasing late camera stream");
                    acquired.stream.stop_all();
                }
                Err(err) => log::debug!("ignoring failure of cancelled start {token}: {err}"),
            }
            return None;
        }

        let acquired = match result {
            Ok(acquired) => acquired,
            Err(err) => {
                log::error!("camera access error: {err}");
                self.state = LifecycleState::Stopped;
                let text = err.user_message(&self.config.messages);
                self.set_status(&text);
                return None;
            }
        };

        if let Some(previous) = self.session.take() {
            log::warn!("replacing camera session {}", previous.epoch());
            self.host.video.detach();
            previous.close();
        }
        self.epoch += 1;
        let session = ScanSession::open(acquired.stream, self.epoch);
        self.host.video.attach(session.stream());
        match session.track() {
            Some(track) => {
                self.illumination.probe(track);
            }
            None => self.illumination.reset(),
        }
        self.host
            .ui
            .set_torch_enabled(self.illumination.control_enabled());
        self.session = Some(session);

        Some(Playback {
            epoch: self.epoch,
            request: self.host.video.play(),
        })
    }

    /// Begin scanning once playback started, or tear down if it failed.
    pub fn finish_playback(&mut self, epoch: u64, result: Result<(), PlatformError>) {
        if self.state != LifecycleState::Starting || self.session_epoch() != Some(epoch) {
            log::debug!("ignoring stale playback result for session {epoch}");
            return;
        }
        if let Err(err) = result {
            log::error!("error playing video: {err}");
            self.teardown();
            self.state = LifecycleState::Stopped;
            let text = self.config.messages.playback_failed.clone();
            self.set_status(&text);
            return;
        }

        let (width, height) = self.host.video.native_size();
        self.sampler.fit(width, height);
        self.state = LifecycleState::Running;
        self.scanning = true;
        self.arm_frame();
        let text = self.config.messages.prompt.clone();
        self.set_status(&text);
    }

    /// One frame tick.
    ///
    /// Returns `None` if the tick was skipped (not scanning, or the video has
    /// not buffered enough data yet).
    pub fn on_frame(&mut self) -> Option<ScanOutcome> {
        self.frame_pending = false;
        if !self.scanning {
            return None;
        }

        let mut outcome = None;
        if self.host.video.has_enough_data() {
            let decoded = self
                .sampler
                .sample(&mut self.host.video, &mut self.host.decoder);
            match decoded {
                Ok(decoded) => {
                    let result = outcome_for(decoded, self.config.url_policy);
                    match &result {
                        ScanOutcome::NotFound => log::trace!("no code in frame"),
                        ScanOutcome::AcceptedAddress(address) => self.accept(address),
                        ScanOutcome::RejectedPayload(payload) => self.reject(payload),
                    }
                    outcome = Some(result);
                }
                Err(err) => {
                    log::error!("QR code scanning error: {err}");
                    outcome = Some(ScanOutcome::NotFound);
                }
            }
        }

        if self.scanning {
            self.arm_frame();
        }
        outcome
    }

    /// Run frame ticks while a frame is requested and `next_frame` agrees.
    ///
    /// Returns the number of ticks processed.
    pub fn run_frames(&mut self, mut next_frame: impl FnMut() -> bool, limit: usize) -> usize {
        let mut ticks = 0;
        while ticks < limit && self.frame_pending && next_frame() {
            self.on_frame();
            ticks += 1;
        }
        ticks
    }

    pub fn on_timer(&mut self, timer: Timer) -> Action {
        if self.state == LifecycleState::Unsupported {
            return Action::None;
        }
        match timer {
            Timer::Start => {
                if self.state == LifecycleState::Stopped && self.session.is_none() {
                    return Action::Start;
                }
            }
            Timer::EndPause { epoch, pause } => self.end_pause(epoch, pause),
            Timer::RevertNotice { notice } => {
                if self.notice_shown == Some(notice) {
                    let text = self.config.messages.prompt.clone();
                    self.set_status(&text);
                }
            }
        }
        Action::None
    }

    pub fn on_visibility(&mut self, visibility: Visibility) -> Action {
        match (visibility, self.state) {
            (_, LifecycleState::Unsupported) => Action::None,
            (Visibility::Hidden, LifecycleState::Stopped) => Action::None,
            (Visibility::Hidden, _) => {
                self.stop();
                Action::None
            }
            (Visibility::Visible, LifecycleState::Stopped) if self.session.is_none() => {
                Action::Start
            }
            (Visibility::Visible, _) => Action::None,
        }
    }

    /// Tear down the session and stop. No-op when already stopped.
    pub fn stop(&mut self) {
        match self.state {
            LifecycleState::Unsupported | LifecycleState::Stopped => return,
            _ => {}
        }
        self.scanning = false;
        self.teardown();
        self.state = LifecycleState::Stopped;
        log::info!("scanner stopped");
    }

    /// Stop the frame loop but keep the stream.
    pub fn suspend(&mut self) {
        self.scanning = false;
        if self.state == LifecycleState::Running {
            self.state = LifecycleState::Paused;
        }
    }

    /// Restart the frame loop after [`Self::suspend`], if the stream is still
    /// present. Cancels a pending [`Self::pause_for`] timer.
    pub fn resume(&mut self) {
        if self.state != LifecycleState::Paused || self.session.is_none() {
            return;
        }
        if self.pause_pending.take().is_some() {
            self.host.ui.set_warning(false);
        }
        self.state = LifecycleState::Running;
        self.scanning = true;
        self.arm_frame();
        let text = self.config.messages.prompt.clone();
        self.set_status(&text);
    }

    /// Suspend now and resume after `delay`.
    pub fn pause_for(&mut self, delay: std::time::Duration) {
        if self.state != LifecycleState::Running {
            return;
        }
        self.suspend();
        self.pause += 1;
        self.pause_pending = Some(self.pause);
        self.host.scheduler.schedule(
            delay,
            Timer::EndPause {
                epoch: self.epoch,
                pause: self.pause,
            },
        );
    }

    /// Start flipping the torch. `None` when nothing needs to be awaited.
    pub fn begin_torch_toggle(&mut self) -> Option<TorchRequest> {
        let track = self.session.as_ref().and_then(|s| s.track());
        match self.illumination.begin_toggle(track) {
            ToggleStep::Ignored => None,
            ToggleStep::Unavailable => {
                self.host.ui.set_torch_enabled(false);
                let text = self.config.messages.torch_unavailable.clone();
                self.show_notice(&text);
                None
            }
            ToggleStep::Apply { target, request } => Some(TorchRequest {
                epoch: self.epoch,
                target,
                request,
            }),
        }
    }

    pub fn finish_torch_toggle(
        &mut self,
        epoch: u64,
        target: bool,
        result: Result<(), PlatformError>,
    ) {
        if self.session_epoch() != Some(epoch) {
            log::debug!("ignoring torch result for closed session {epoch}");
            return;
        }
        if self.illumination.finish_toggle(target, result) {
            self.host.ui.set_torch_active(target);
        } else {
            self.host.ui.set_torch_enabled(false);
            let text = self.config.messages.torch_failed.clone();
            self.show_notice(&text);
        }
    }

    fn accept(&mut self, address: &str) {
        log::info!("QR code detected: {address}");
        self.scanning = false;
        self.stop();
        let text = self.config.messages.found(address);
        self.set_status(&text);
        self.host.navigator.navigate(address);
    }

    fn reject(&mut self, payload: &str) {
        log::warn!("QR code does not contain an acceptable URL: {payload:?}");
        let text = self.config.messages.rejected.clone();
        self.set_status(&text);
        self.host.ui.set_warning(true);
        self.pause_for(self.config.pause());
    }

    fn end_pause(&mut self, epoch: u64, pause: u64) {
        // Superseded by a later pause, or cancelled by an early resume.
        if self.pause_pending != Some(pause) {
            return;
        }
        self.pause_pending = None;
        self.host.ui.set_warning(false);
        if self.session_epoch() == Some(epoch) {
            self.resume();
        }
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.host.video.detach();
            session.close();
        }
        if self.illumination.state().on {
            self.host.ui.set_torch_active(false);
        }
        self.illumination.reset();
        self.host.ui.set_torch_enabled(false);
    }

    fn arm_frame(&mut self) {
        if !self.frame_pending {
            self.frame_pending = true;
            self.host.scheduler.request_frame();
        }
    }

    fn session_epoch(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.epoch())
    }

    fn set_status(&mut self, text: &str) {
        self.notice_shown = None;
        self.status.clear();
        self.status.push_str(text);
        self.host.ui.set_status(text);
    }

    fn show_notice(&mut self, text: &str) {
        self.set_status(text);
        self.notice += 1;
        self.notice_shown = Some(self.notice);
        self.host.scheduler.schedule(
            self.config.notice(),
            Timer::RevertNotice {
                notice: self.notice,
            },
        );
    }
}
