use crate::platform::{CameraStream, VideoTrack};

/// A live camera stream and its selected video track.
///
/// The epoch identifies the session in deferred callbacks so that a timer
/// armed for one session never acts on a later one.
pub struct ScanSession<S: CameraStream> {
    stream: S,
    track: Option<S::Track>,
    epoch: u64,
}

impl<S: CameraStream> ScanSession<S> {
    /// Wrap `stream`, selecting its first video track.
    pub fn open(stream: S, epoch: u64) -> Self {
        let track = stream.video_tracks().into_iter().next();
        match &track {
            Some(track) => log::info!("video track obtained: {}", track.label()),
            None => log::warn!("camera stream has no video track"),
        }
        Self {
            stream,
            track,
            epoch,
        }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn track(&self) -> Option<&S::Track> {
        self.track.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Stop every track and release the stream.
    pub fn close(self) {
        self.stream.stop_all();
        log::debug!("camera session {} closed", self.epoch);
    }
}
