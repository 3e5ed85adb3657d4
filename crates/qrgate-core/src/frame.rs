//! Frame sampling and the bridge to the decoding collaborator.

use serde::{Deserialize, Serialize};

use crate::platform::{PlatformError, VideoSurface};

/// Row-major RGBA raster, 4 bytes per pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaFrame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::byte_len(width, height)],
        }
    }

    #[inline]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resize to `width x height`, keeping the allocation when possible.
    ///
    /// Returns `true` if the dimensions changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(Self::byte_len(width, height), 0);
        true
    }
}

/// Which luminance polarities the decoder tries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inversion {
    /// Dark modules on a light background only.
    #[default]
    DontInvert,
    OnlyInvert,
    AttemptBoth,
    InvertFirst,
}

impl Inversion {
    /// Passes to run, `true` meaning "on the inverted image".
    pub fn passes(self) -> &'static [bool] {
        match self {
            Inversion::DontInvert => &[false],
            Inversion::OnlyInvert => &[true],
            Inversion::AttemptBoth => &[false, true],
            Inversion::InvertFirst => &[true, false],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    #[serde(default)]
    pub inversion: Inversion,
}

/// Text extracted from one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPayload {
    pub payload: String,
}

impl DecodedPayload {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Errors produced while sampling or decoding a single frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid RGBA buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("frame capture failed: {0}")]
    Capture(#[from] PlatformError),

    #[error("decoder failure: {0}")]
    Backend(String),
}

/// The decoding collaborator: raw RGBA pixels in, payload or nothing out.
///
/// Called at most once at a time, on the scanner's thread.
pub trait Decoder {
    fn decode(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Result<Option<DecodedPayload>, DecodeError>;
}

impl<F> Decoder for F
where
    F: FnMut(&[u8], u32, u32, &DecodeOptions) -> Result<Option<DecodedPayload>, DecodeError>,
{
    fn decode(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Result<Option<DecodedPayload>, DecodeError> {
        self(pixels, width, height, options)
    }
}

/// Copies video frames into a reusable raster and decodes them.
#[derive(Debug, Default)]
pub struct FrameSampler {
    raster: RgbaFrame,
    options: DecodeOptions,
}

impl FrameSampler {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            raster: RgbaFrame::default(),
            options,
        }
    }

    pub fn raster(&self) -> &RgbaFrame {
        &self.raster
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Match the raster to the video's native resolution.
    pub fn fit(&mut self, width: u32, height: u32) -> bool {
        if self.raster.resize(width, height) {
            log::debug!("raster sized to {width}x{height}");
            true
        } else {
            false
        }
    }

    /// Sample the current frame of `video` and run `decoder` on it.
    ///
    /// The caller checks buffered-data readiness first.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
    pub fn sample<V, D>(
        &mut self,
        video: &mut V,
        decoder: &mut D,
    ) -> Result<Option<DecodedPayload>, DecodeError>
    where
        V: VideoSurface,
        D: Decoder,
    {
        let (width, height) = video.native_size();
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        self.fit(width, height);

        video.draw_frame(&mut self.raster)?;
        decoder.decode(
            &self.raster.data,
            self.raster.width,
            self.raster.height,
            &self.options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CameraStream, PlatformFuture, VideoTrack};
    use crate::TrackCapabilities;

    #[derive(Clone)]
    struct NoTrack;

    impl VideoTrack for NoTrack {
        fn label(&self) -> String {
            String::new()
        }
        fn capabilities(&self) -> Result<Option<TrackCapabilities>, PlatformError> {
            Ok(None)
        }
        fn apply_torch(&self, _on: bool) -> Option<PlatformFuture> {
            None
        }
        fn stop(&self) {}
    }

    struct NoStream;

    impl CameraStream for NoStream {
        type Track = NoTrack;
        fn video_tracks(&self) -> Vec<NoTrack> {
            Vec::new()
        }
        fn stop_all(&self) {}
    }

    struct GreyVideo {
        size: (u32, u32),
        shade: u8,
        fail: bool,
    }

    impl VideoSurface for GreyVideo {
        type Stream = NoStream;
        fn attach(&mut self, _stream: &NoStream) {}
        fn detach(&mut self) {}
        fn play(&mut self) -> PlatformFuture {
            Box::pin(async { Ok::<(), PlatformError>(()) })
        }
        fn has_enough_data(&self) -> bool {
            true
        }
        fn native_size(&self) -> (u32, u32) {
            self.size
        }
        fn draw_frame(&mut self, raster: &mut RgbaFrame) -> Result<(), PlatformError> {
            if self.fail {
                return Err(PlatformError::rejected("SecurityError", "tainted canvas"));
            }
            raster.data.fill(self.shade);
            Ok(())
        }
    }

    fn never_found(
        _: &[u8],
        _: u32,
        _: u32,
        _: &DecodeOptions,
    ) -> Result<Option<DecodedPayload>, DecodeError> {
        Ok(None)
    }

    #[test]
    fn sample_passes_raster_and_options_to_decoder() {
        let mut video = GreyVideo {
            size: (4, 3),
            shade: 9,
            fail: false,
        };
        let mut sampler = FrameSampler::new(DecodeOptions::default());
        let mut seen = None;
        let mut decoder = |pixels: &[u8],
                           w: u32,
                           h: u32,
                           opts: &DecodeOptions|
         -> Result<Option<DecodedPayload>, DecodeError> {
            seen = Some((pixels.len(), w, h, opts.inversion, pixels[0]));
            Ok(Some(DecodedPayload::new("hello")))
        };

        let out = sampler.sample(&mut video, &mut decoder).expect("decode");
        assert_eq!(out, Some(DecodedPayload::new("hello")));
        assert_eq!(seen, Some((48, 4, 3, Inversion::DontInvert, 9)));
    }

    #[test]
    fn raster_follows_native_size_changes() {
        let mut video = GreyVideo {
            size: (2, 2),
            shade: 0,
            fail: false,
        };
        let mut sampler = FrameSampler::default();
        let mut decoder = never_found;
        sampler.sample(&mut video, &mut decoder).expect("first");
        assert_eq!(sampler.raster().data.len(), 16);

        video.size = (3, 1);
        sampler.sample(&mut video, &mut decoder).expect("second");
        assert_eq!((sampler.raster().width, sampler.raster().height), (3, 1));
        assert_eq!(sampler.raster().data.len(), 12);
    }

    #[test]
    fn zero_sized_video_is_reported() {
        let mut video = GreyVideo {
            size: (0, 0),
            shade: 0,
            fail: false,
        };
        let mut decoder = never_found;
        let err = FrameSampler::default()
            .sample(&mut video, &mut decoder)
            .expect_err("no size");
        assert!(matches!(err, DecodeError::InvalidDimensions { .. }));
    }

    #[test]
    fn capture_failure_becomes_decode_error() {
        let mut video = GreyVideo {
            size: (1, 1),
            shade: 0,
            fail: true,
        };
        let mut decoder = never_found;
        let err = FrameSampler::default()
            .sample(&mut video, &mut decoder)
            .expect_err("capture fails");
        assert!(matches!(err, DecodeError::Capture(_)));
    }
}
