//! Host capabilities the scanner drives.
//!
//! A browser implements these with `web-sys`; tests implement them with
//! in-memory fakes. Methods that may be missing on older platforms
//! (`VideoTrack::capabilities`, `VideoTrack::apply_torch`) report absence
//! instead of failing.

use futures::future::LocalBoxFuture;

use crate::frame::{Decoder, RgbaFrame};
use crate::illumination::TrackCapabilities;
use crate::schedule::Scheduler;

/// Error raised by a host call.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{operation} is not available on this platform")]
    Unsupported { operation: &'static str },
    #[error("{name}: {message}")]
    Rejected { name: String, message: String },
}

impl PlatformError {
    pub fn rejected(name: impl Into<String>, message: impl Into<String>) -> Self {
        PlatformError::Rejected {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Pending host request that resolves once, on the scanner's thread.
pub type PlatformFuture = LocalBoxFuture<'static, Result<(), PlatformError>>;

/// A single camera track.
pub trait VideoTrack: Clone {
    fn label(&self) -> String;

    /// Query the track capabilities.
    ///
    /// Returns `Ok(None)` when the platform has no capability query at all.
    fn capabilities(&self) -> Result<Option<TrackCapabilities>, PlatformError>;

    /// Request the torch on or off.
    ///
    /// Returns `None` when the platform cannot apply constraints to a track.
    fn apply_torch(&self, on: bool) -> Option<PlatformFuture>;

    fn stop(&self);
}

/// A live camera stream.
pub trait CameraStream {
    type Track: VideoTrack;

    fn video_tracks(&self) -> Vec<Self::Track>;

    /// Stop every track of the stream, video or not.
    fn stop_all(&self);
}

/// The element presenting the live stream plus its off-screen raster.
pub trait VideoSurface {
    type Stream: CameraStream;

    fn attach(&mut self, stream: &Self::Stream);
    fn detach(&mut self);
    fn play(&mut self) -> PlatformFuture;

    /// True once enough data is buffered to draw the current frame.
    fn has_enough_data(&self) -> bool;

    /// Native (intrinsic) video resolution, `(0, 0)` while unknown.
    fn native_size(&self) -> (u32, u32);

    /// Copy the current frame into `raster`, scaled to the raster size.
    fn draw_frame(&mut self, raster: &mut RgbaFrame) -> Result<(), PlatformError>;
}

/// Status text, warning style and the torch control.
pub trait ScannerUi {
    fn set_status(&mut self, text: &str);
    fn set_warning(&mut self, on: bool);
    fn set_torch_enabled(&mut self, enabled: bool);
    fn set_torch_active(&mut self, active: bool);
}

/// Page navigation. Fire-and-forget.
pub trait Navigator {
    fn navigate(&mut self, address: &str);
}

/// Bundle of host types used by one [`crate::Scanner`].
pub trait Platform {
    type Stream: CameraStream;
    type Video: VideoSurface<Stream = Self::Stream>;
    type Ui: ScannerUi;
    type Navigator: Navigator;
    type Scheduler: Scheduler;
    type Decoder: Decoder;
}

/// Owned host components for a [`crate::Scanner`].
pub struct Host<P: Platform> {
    pub video: P::Video,
    pub ui: P::Ui,
    pub navigator: P::Navigator,
    pub scheduler: P::Scheduler,
    pub decoder: P::Decoder,
}
