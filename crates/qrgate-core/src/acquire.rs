//! Camera stream acquisition with a prioritized constraint fallback.

use futures::future::LocalBoxFuture;

use crate::constraints::ConstraintSet;
use crate::messages::Messages;
use crate::platform::CameraStream;

/// Source of camera streams (`navigator.mediaDevices` in a browser).
pub trait MediaDevices {
    type Stream: CameraStream;

    fn get_user_media(
        &self,
        constraints: &ConstraintSet,
    ) -> LocalBoxFuture<'static, Result<Self::Stream, AcquireFailure>>;
}

/// Classification of a single failed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Denied,
    NoDevice,
    Busy,
    Overconstrained,
    Other,
}

impl FailureKind {
    /// Map a platform error name (`DOMException.name`) to a kind.
    pub fn from_error_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => FailureKind::Denied,
            "NotFoundError" | "DevicesNotFoundError" => FailureKind::NoDevice,
            "NotReadableError" | "TrackStartError" | "AbortError" => FailureKind::Busy,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => FailureKind::Overconstrained,
            _ => FailureKind::Other,
        }
    }
}

/// One rejected `get_user_media` request.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct AcquireFailure {
    pub kind: FailureKind,
    pub name: String,
    pub message: String,
}

impl AcquireFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: FailureKind::from_error_name(&name),
            name,
            message: message.into(),
        }
    }
}

/// Outcome of a fully failed acquisition.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum AcquireError {
    #[error("camera permission denied")]
    Denied,
    #[error("no camera found")]
    NoDevice,
    #[error("camera busy or unreadable")]
    Busy,
    #[error("camera constraints cannot be satisfied")]
    Overconstrained,
    #[error("camera error: {0}")]
    Other(String),
    #[error("no constraint sets to try")]
    EmptyPlan,
}

impl AcquireError {
    /// Reduce the per-attempt failures to one classified error.
    ///
    /// A permission refusal wins over anything else; otherwise the last
    /// attempt, the least restrictive one, decides.
    pub fn from_failures(failures: &[AcquireFailure]) -> Self {
        if failures.iter().any(|f| f.kind == FailureKind::Denied) {
            return AcquireError::Denied;
        }
        let Some(last) = failures.last() else {
            return AcquireError::EmptyPlan;
        };
        match last.kind {
            FailureKind::Denied => AcquireError::Denied,
            FailureKind::NoDevice => AcquireError::NoDevice,
            FailureKind::Busy => AcquireError::Busy,
            FailureKind::Overconstrained => AcquireError::Overconstrained,
            FailureKind::Other if last.message.is_empty() => {
                AcquireError::Other("Unable to access any camera".into())
            }
            FailureKind::Other => AcquireError::Other(last.message.clone()),
        }
    }

    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            AcquireError::Denied => messages.camera_denied.clone(),
            AcquireError::NoDevice => messages.camera_missing.clone(),
            AcquireError::Busy => messages.camera_busy.clone(),
            AcquireError::Overconstrained => messages.camera_overconstrained.clone(),
            AcquireError::Other(msg) => messages.camera_other(msg),
            AcquireError::EmptyPlan => messages.camera_other(""),
        }
    }
}

/// A stream obtained by [`acquire_stream`].
pub struct Acquired<S> {
    pub stream: S,
    /// Index into the plan of the request that succeeded.
    pub attempt: usize,
}

/// Try each constraint set in order until one yields a stream.
///
/// Individual failures are logged and swallowed; only the exhaustion of the
/// whole plan is an error.
pub async fn acquire_stream<D: MediaDevices>(
    devices: &D,
    plan: &[ConstraintSet],
) -> Result<Acquired<D::Stream>, AcquireError> {
    let mut failures = Vec::with_capacity(plan.len());
    for (attempt, constraints) in plan.iter().enumerate() {
        match devices.get_user_media(constraints).await {
            Ok(stream) => {
                log::info!("camera access successful ({constraints})");
                return Ok(Acquired { stream, attempt });
            }
            Err(failure) => {
                log::warn!("camera request with {constraints} failed: {failure}");
                failures.push(failure);
            }
        }
    }
    log::error!("all camera access attempts failed");
    Err(AcquireError::from_failures(&failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformError, PlatformFuture, VideoTrack};
    use crate::TrackCapabilities;
    use futures::executor::block_on;
    use futures::FutureExt;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Clone)]
    struct Track;

    impl VideoTrack for Track {
        fn label(&self) -> String {
            "cam".into()
        }
        fn capabilities(&self) -> Result<Option<TrackCapabilities>, PlatformError> {
            Ok(None)
        }
        fn apply_torch(&self, _on: bool) -> Option<PlatformFuture> {
            None
        }
        fn stop(&self) {}
    }

    #[derive(Debug, PartialEq)]
    struct Stream(usize);

    impl CameraStream for Stream {
        type Track = Track;
        fn video_tracks(&self) -> Vec<Track> {
            vec![Track]
        }
        fn stop_all(&self) {}
    }

    struct Scripted {
        replies: RefCell<VecDeque<Result<usize, &'static str>>>,
        seen: RefCell<Vec<ConstraintSet>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<usize, &'static str>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl MediaDevices for Scripted {
        type Stream = Stream;

        fn get_user_media(
            &self,
            constraints: &ConstraintSet,
        ) -> LocalBoxFuture<'static, Result<Stream, AcquireFailure>> {
            self.seen.borrow_mut().push(*constraints);
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err("NotFoundError"));
            async move { reply.map(Stream).map_err(|name| AcquireFailure::new(name, "")) }
                .boxed_local()
        }
    }

    fn full_plan() -> Vec<ConstraintSet> {
        crate::FallbackPlan::Full.constraint_sets(None)
    }

    #[test]
    fn first_success_wins_and_later_sets_are_not_tried() {
        let devices = Scripted::new(vec![Ok(1), Ok(2)]);
        let acquired = block_on(acquire_stream(&devices, &full_plan())).expect("stream");
        assert_eq!(acquired.stream, Stream(1));
        assert_eq!(acquired.attempt, 0);
        assert_eq!(devices.seen.borrow().len(), 1);
    }

    #[test]
    fn falls_back_in_order_of_preference() {
        let devices = Scripted::new(vec![Err("OverconstrainedError"), Err("NotFoundError"), Ok(3)]);
        let acquired = block_on(acquire_stream(&devices, &full_plan())).expect("stream");
        assert_eq!(acquired.stream, Stream(3));
        assert_eq!(acquired.attempt, 2);
        assert_eq!(*devices.seen.borrow(), full_plan());
    }

    #[test]
    fn exhausted_plan_is_classified() {
        let devices = Scripted::new(vec![
            Err("OverconstrainedError"),
            Err("NotAllowedError"),
            Err("NotFoundError"),
        ]);
        let err = block_on(acquire_stream(&devices, &full_plan())).err();
        assert_eq!(err, Some(AcquireError::Denied));

        let devices = Scripted::new(vec![
            Err("OverconstrainedError"),
            Err("NotReadableError"),
            Err("AbortError"),
        ]);
        let err = block_on(acquire_stream(&devices, &full_plan())).err();
        assert_eq!(err, Some(AcquireError::Busy));
    }

    #[test]
    fn empty_plan_fails_without_requests() {
        let devices = Scripted::new(vec![Ok(1)]);
        let err = block_on(acquire_stream(&devices, &[])).err();
        assert_eq!(err, Some(AcquireError::EmptyPlan));
        assert!(devices.seen.borrow().is_empty());
    }

    #[test]
    fn error_names_map_to_messages() {
        let messages = Messages::default();
        let other = AcquireError::from_failures(&[AcquireFailure::new("TypeError", "bad")]);
        assert_eq!(other.user_message(&messages), "Camera error: bad");
        assert_eq!(
            AcquireError::Overconstrained.user_message(&messages),
            messages.camera_overconstrained
        );
        assert_eq!(
            FailureKind::from_error_name("NotFoundError"),
            FailureKind::NoDevice
        );
    }
}
