//! `navigator.mediaDevices` and camera tracks.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::{Array, Function, Object, Reflect};
use qrgate_core::{
    AcquireFailure, CameraStream, ConstraintSet, FacingConstraint, MediaDevices, PlatformError,
    PlatformFuture, TrackCapabilities, VideoTrack,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, MediaStream, MediaStreamConstraints, MediaStreamTrack, Window};

/// Split a rejected promise value into `(name, message)`.
pub(crate) fn js_error(err: &JsValue) -> (String, String) {
    if let Some(dom) = err.dyn_ref::<DomException>() {
        return (dom.name(), dom.message());
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return (error.name().into(), error.message().into());
    }
    match err.as_string() {
        Some(text) => ("Error".to_owned(), text),
        None => ("Error".to_owned(), format!("{err:?}")),
    }
}

pub(crate) fn platform_error(err: JsValue) -> PlatformError {
    let (name, message) = js_error(&err);
    PlatformError::rejected(name, message)
}

fn set(target: &Object, key: &str, value: &JsValue) {
    // Reflect.set only fails on frozen or non-object targets.
    let _ = Reflect::set(target, &JsValue::from_str(key), value);
}

/// Look up `target[name]` and return it if it is callable.
fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn ideal(value: u32) -> JsValue {
    let obj = Object::new();
    set(&obj, "ideal", &JsValue::from(value));
    obj.into()
}

/// The `video` member of a `getUserMedia` request.
fn video_constraints(constraints: &ConstraintSet) -> JsValue {
    if constraints.is_any() {
        return JsValue::TRUE;
    }
    let video = Object::new();
    match constraints.facing {
        Some(FacingConstraint::Exact(mode)) => {
            let facing = Object::new();
            set(&facing, "exact", &JsValue::from_str(mode.as_str()));
            set(&video, "facingMode", &facing);
        }
        Some(FacingConstraint::Ideal(mode)) => {
            set(&video, "facingMode", &JsValue::from_str(mode.as_str()));
        }
        None => {}
    }
    if let Some(res) = constraints.resolution {
        set(&video, "width", &ideal(res.width));
        set(&video, "height", &ideal(res.height));
    }
    video.into()
}

fn request_object(constraints: &ConstraintSet) -> MediaStreamConstraints {
    let request = Object::new();
    set(&request, "video", &video_constraints(constraints));
    set(&request, "audio", &JsValue::FALSE);
    request.unchecked_into()
}

/// `navigator.mediaDevices`, present only in secure contexts.
pub struct WebMediaDevices {
    devices: web_sys::MediaDevices,
}

impl WebMediaDevices {
    /// `None` when the browser cannot acquire camera streams at all.
    pub fn detect(window: &Window) -> Option<Self> {
        let navigator = window.navigator();
        let devices = Reflect::get(&navigator, &JsValue::from_str("mediaDevices")).ok()?;
        if devices.is_undefined() || devices.is_null() {
            return None;
        }
        method(&devices, "getUserMedia")?;
        Some(Self {
            devices: devices.unchecked_into(),
        })
    }
}

impl MediaDevices for WebMediaDevices {
    type Stream = WebStream;

    fn get_user_media(
        &self,
        constraints: &ConstraintSet,
    ) -> LocalBoxFuture<'static, Result<WebStream, AcquireFailure>> {
        let failure = |err: JsValue| {
            let (name, message) = js_error(&err);
            AcquireFailure::new(name, message)
        };
        let promise = self
            .devices
            .get_user_media_with_constraints(&request_object(constraints));
        async move {
            let promise = promise.map_err(failure)?;
            let stream = JsFuture::from(promise).await.map_err(failure)?;
            Ok(WebStream {
                stream: stream.unchecked_into(),
            })
        }
        .boxed_local()
    }
}

pub struct WebStream {
    stream: MediaStream,
}

impl WebStream {
    pub fn raw(&self) -> &MediaStream {
        &self.stream
    }
}

fn tracks(array: Array) -> Vec<WebTrack> {
    array
        .iter()
        .map(|track| WebTrack {
            track: track.unchecked_into(),
        })
        .collect()
}

impl CameraStream for WebStream {
    type Track = WebTrack;

    fn video_tracks(&self) -> Vec<WebTrack> {
        tracks(self.stream.get_video_tracks())
    }

    fn stop_all(&self) {
        for track in tracks(self.stream.get_tracks()) {
            track.stop();
        }
    }
}

#[derive(Clone)]
pub struct WebTrack {
    track: MediaStreamTrack,
}

impl VideoTrack for WebTrack {
    fn label(&self) -> String {
        self.track.label()
    }

    fn capabilities(&self) -> Result<Option<TrackCapabilities>, PlatformError> {
        let Some(get_capabilities) = method(&self.track, "getCapabilities") else {
            return Ok(None);
        };
        let caps = get_capabilities.call0(&self.track).map_err(platform_error)?;
        if caps.is_undefined() || caps.is_null() {
            return Ok(None);
        }
        let torch = Reflect::get(&caps, &JsValue::from_str("torch")).map_err(platform_error)?;
        Ok(Some(TrackCapabilities {
            torch: torch.is_truthy(),
        }))
    }

    fn apply_torch(&self, on: bool) -> Option<PlatformFuture> {
        let apply = method(&self.track, "applyConstraints")?;
        let torch = Object::new();
        set(&torch, "torch", &JsValue::from_bool(on));
        let request = Object::new();
        set(&request, "advanced", &Array::of1(&torch));

        let promise = apply.call1(&self.track, &request);
        Some(
            async move {
                let promise = promise.map_err(platform_error)?;
                let promise = promise
                    .dyn_into::<js_sys::Promise>()
                    .map_err(platform_error)?;
                JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(platform_error)
            }
            .boxed_local(),
        )
    }

    fn stop(&self) {
        self.track.stop();
    }
}
