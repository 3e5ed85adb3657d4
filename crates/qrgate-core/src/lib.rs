//! Core pipeline for a camera-driven QR gateway.
//!
//! The crate owns the whole scan loop: it acquires a camera stream through a
//! prioritized list of constraint sets, samples one video frame per display
//! refresh, hands the pixels to a decoder, validates the payload as a web
//! address and navigates to it. It also drives the torch and suspends the
//! pipeline while the page is hidden.
//!
//! It does *not* touch any browser API directly. Every host facility is a
//! trait in [`platform`] (plus [`MediaDevices`], [`Decoder`] and
//! [`Scheduler`]), so the state machine in [`Scanner`] runs unchanged against
//! `web-sys` bindings or test fakes.
//!
//! ## Driving a scanner
//!
//! Synchronous events (`on_frame`, `on_timer`, `on_visibility`) are plain
//! methods. The three asynchronous requests (stream acquisition, video
//! playback and torch constraints) are split into begin/finish halves and
//! composed by the functions in [`driver`], which never hold the scanner
//! borrow across an await point.

mod acquire;
mod config;
mod constraints;
pub mod driver;
mod frame;
mod illumination;
mod logger;
mod messages;
pub mod platform;
mod scanner;
mod schedule;
mod session;
mod validate;

pub use acquire::{
    acquire_stream, AcquireError, AcquireFailure, Acquired, FailureKind, MediaDevices,
};
pub use config::{ConfigError, ScannerConfig};
pub use constraints::{ConstraintSet, FacingConstraint, FacingMode, FallbackPlan, Resolution};
pub use frame::{
    DecodeError, DecodeOptions, DecodedPayload, Decoder, FrameSampler, Inversion, RgbaFrame,
};
pub use illumination::{IlluminationController, IlluminationState, ToggleStep, TrackCapabilities};
pub use messages::Messages;
pub use platform::{
    CameraStream, Host, Navigator, Platform, PlatformError, PlatformFuture, ScannerUi,
    VideoSurface, VideoTrack,
};
pub use scanner::{
    Action, LifecycleState, Playback, Scanner, StartRequest, TorchRequest, Visibility,
};
pub use schedule::{ManualScheduler, Scheduler, Timer};
pub use session::ScanSession;
pub use validate::{classify, ScanOutcome, UrlPolicy};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, init_with_sink, LogClock, LogSink};
