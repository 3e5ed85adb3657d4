//! Page elements the scanner draws on.

use futures::FutureExt;
use js_sys::{Object, Reflect};
use qrgate_core::{Navigator, PlatformError, PlatformFuture, RgbaFrame, ScannerUi, VideoSurface};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlButtonElement, HtmlCanvasElement,
    HtmlMediaElement, HtmlVideoElement, Location,
};

use crate::media::{platform_error, WebStream};

/// Fetch `#id` and cast it to `T`.
pub(crate) fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("element #{id} not found")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has the wrong type")))
}

/// The live `<video>` plus the off-screen canvas frames are read back from.
pub struct WebVideo {
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl WebVideo {
    pub fn new(video: HtmlVideoElement, canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let options = Object::new();
        Reflect::set(&options, &"willReadFrequently".into(), &JsValue::TRUE)?;
        let context = canvas
            .get_context_with_context_options("2d", &options)?
            .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            video,
            canvas,
            context,
        })
    }
}

impl VideoSurface for WebVideo {
    type Stream = WebStream;

    fn attach(&mut self, stream: &WebStream) {
        self.video.set_src_object(Some(stream.raw()));
        // iOS refuses inline playback without it.
        if let Err(err) = self.video.set_attribute("playsinline", "true") {
            log::warn!("could not mark video as inline: {:?}", err);
        }
    }

    fn detach(&mut self) {
        self.video.set_src_object(None);
    }

    fn play(&mut self) -> PlatformFuture {
        let promise = self.video.play();
        async move {
            let promise = promise.map_err(platform_error)?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(platform_error)
        }
        .boxed_local()
    }

    fn has_enough_data(&self) -> bool {
        self.video.ready_state() == HtmlMediaElement::HAVE_ENOUGH_DATA
    }

    fn native_size(&self) -> (u32, u32) {
        (self.video.video_width(), self.video.video_height())
    }

    fn draw_frame(&mut self, raster: &mut RgbaFrame) -> Result<(), PlatformError> {
        let (width, height) = (raster.width, raster.height);
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        let (w, h) = (f64::from(width), f64::from(height));
        self.context
            .draw_image_with_html_video_element_and_dw_and_dh(&self.video, 0.0, 0.0, w, h)
            .map_err(platform_error)?;
        let image = self
            .context
            .get_image_data(0.0, 0.0, w, h)
            .map_err(platform_error)?;
        let data = image.data();
        if data.len() != raster.data.len() {
            return Err(PlatformError::rejected(
                "IndexSizeError",
                format!(
                    "canvas returned {} bytes for a {width}x{height} raster",
                    data.len()
                ),
            ));
        }
        raster.data.copy_from_slice(&data);
        Ok(())
    }
}

/// Status line and torch button.
pub struct WebUi {
    status: Element,
    torch: HtmlButtonElement,
}

impl WebUi {
    pub fn new(status: Element, torch: HtmlButtonElement) -> Self {
        Self { status, torch }
    }
}

fn toggle_class(element: &Element, class: &str, on: bool) {
    if let Err(err) = element.class_list().toggle_with_force(class, on) {
        log::warn!("could not toggle class {class}: {:?}", err);
    }
}

impl ScannerUi for WebUi {
    fn set_status(&mut self, text: &str) {
        self.status.set_text_content(Some(text));
    }

    fn set_warning(&mut self, on: bool) {
        toggle_class(&self.status, "warning", on);
    }

    fn set_torch_enabled(&mut self, enabled: bool) {
        self.torch.set_disabled(!enabled);
    }

    fn set_torch_active(&mut self, active: bool) {
        toggle_class(&self.torch, "active", active);
    }
}

pub struct WebNavigator {
    location: Location,
}

impl WebNavigator {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl Navigator for WebNavigator {
    fn navigate(&mut self, address: &str) {
        if let Err(err) = self.location.set_href(address) {
            log::error!("navigation to {address} failed: {:?}", err);
        }
    }
}
