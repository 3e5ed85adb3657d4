//! Browser front end for the qrgate scanner.
//!
//! `mount` binds a [`qrgate_core::Scanner`] to four page elements (the live
//! video, an off-screen canvas, the status line and the torch button) and
//! wires page visibility and torch clicks into it. Frames are decoded in-process
//! by [`qrgate_decode::QrDecoder`].
//!
//! ```js
//! import init, { mount } from "./qrgate_web.js";
//! await init();
//! const scanner = mount({ status_id: "result-text", config: { pause_ms: 2000 } });
//! ```

mod console;
mod dom;
mod media;
mod schedule;

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use qrgate_core::{
    driver, Action, Host, LifecycleState, Platform, Scanner, ScannerConfig, Timer, Visibility,
};
use qrgate_decode::QrDecoder;
use serde::Deserialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub use dom::{WebNavigator, WebUi, WebVideo};
pub use media::{WebMediaDevices, WebStream, WebTrack};
pub use schedule::WebScheduler;

/// Host types backed by `web-sys`.
pub struct WebPlatform;

impl Platform for WebPlatform {
    type Stream = WebStream;
    type Video = WebVideo;
    type Ui = WebUi;
    type Navigator = WebNavigator;
    type Scheduler = WebScheduler;
    type Decoder = QrDecoder;
}

/// Options accepted by [`mount`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
struct MountOptions {
    video_id: String,
    canvas_id: String,
    status_id: String,
    torch_id: String,
    log_level: String,
    config: ScannerConfig,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            video_id: "video".into(),
            canvas_id: "canvas".into(),
            status_id: "result-text".into(),
            torch_id: "flash-button".into(),
            log_level: "info".into(),
            config: ScannerConfig::default(),
        }
    }
}

impl MountOptions {
    fn level(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }
}

pub(crate) struct App {
    scanner: RefCell<Scanner<WebPlatform>>,
    devices: Option<WebMediaDevices>,
}

impl App {
    pub(crate) fn frame(&self) {
        self.scanner.borrow_mut().on_frame();
    }

    pub(crate) fn timer(self: &Rc<Self>, timer: Timer) {
        let action = self.scanner.borrow_mut().on_timer(timer);
        self.perform(action);
    }

    fn visibility(self: &Rc<Self>, visibility: Visibility) {
        let action = self.scanner.borrow_mut().on_visibility(visibility);
        self.perform(action);
    }

    fn perform(self: &Rc<Self>, action: Action) {
        if action != Action::Start || self.devices.is_none() {
            return;
        }
        let app = Rc::clone(self);
        spawn_local(async move {
            if let Some(devices) = &app.devices {
                let state = driver::start(&app.scanner, devices).await;
                log::debug!("start finished in state {state:?}");
            }
        });
    }

    fn toggle_torch(self: &Rc<Self>) {
        let app = Rc::clone(self);
        spawn_local(async move {
            driver::toggle_torch(&app.scanner).await;
        });
    }
}

fn listen<F>(target: &web_sys::EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut() + 'static,
{
    let closure = Closure::<dyn FnMut()>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

/// Mount the scanner on the current page and start it.
///
/// `options` may be `undefined`; every field has a default.
#[wasm_bindgen]
pub fn mount(options: JsValue) -> Result<ScannerHandle, JsValue> {
    let options: MountOptions = if options.is_undefined() || options.is_null() {
        MountOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    if let Err(err) = qrgate_core::init_with_sink(options.level(), console::sink, console::clock)
    {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger not installed: {err}")));
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let video = WebVideo::new(
        dom::element(&document, &options.video_id)?,
        dom::element(&document, &options.canvas_id)?,
    )?;
    let ui = WebUi::new(
        dom::element(&document, &options.status_id)?,
        dom::element(&document, &options.torch_id)?,
    );
    let navigator = WebNavigator::new(window.location());
    let devices = WebMediaDevices::detect(&window);
    let supported = devices.is_some();

    let app = Rc::new_cyclic(|weak| {
        let host = Host {
            video,
            ui,
            navigator,
            scheduler: WebScheduler::new(window.clone(), weak.clone()),
            decoder: QrDecoder::new(),
        };
        App {
            scanner: RefCell::new(Scanner::new(options.config.clone(), host)),
            devices,
        }
    });

    if app.scanner.borrow_mut().initialize(supported) {
        let weak = Rc::downgrade(&app);
        let doc = document.clone();
        listen(&document, "visibilitychange", move || {
            if let Some(app) = weak.upgrade() {
                let visibility = if doc.hidden() {
                    Visibility::Hidden
                } else {
                    Visibility::Visible
                };
                app.visibility(visibility);
            }
        })?;

        let weak = Rc::downgrade(&app);
        let torch: web_sys::EventTarget = dom::element(&document, &options.torch_id)?;
        listen(&torch, "click", move || {
            if let Some(app) = weak.upgrade() {
                app.toggle_torch();
            }
        })?;
    }

    Ok(ScannerHandle { app })
}

/// Handle returned to JavaScript by [`mount`].
#[wasm_bindgen]
pub struct ScannerHandle {
    app: Rc<App>,
}

#[wasm_bindgen]
impl ScannerHandle {
    /// Start scanning if stopped.
    pub fn start(&self) {
        self.app.perform(Action::Start);
    }

    /// Stop scanning and release the camera.
    pub fn stop(&self) {
        self.app.scanner.borrow_mut().stop();
    }

    #[wasm_bindgen(js_name = toggleTorch)]
    pub fn toggle_torch(&self) {
        self.app.toggle_torch();
    }

    /// One of `unsupported`, `stopped`, `starting`, `running`, `paused`.
    pub fn state(&self) -> String {
        state_name(self.app.scanner.borrow().state()).to_owned()
    }

    #[wasm_bindgen(js_name = isScanning)]
    pub fn is_scanning(&self) -> bool {
        self.app.scanner.borrow().is_scanning()
    }

    pub fn status(&self) -> String {
        self.app.scanner.borrow().status().to_owned()
    }
}

fn state_name(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Unsupported => "unsupported",
        LifecycleState::Stopped => "stopped",
        LifecycleState::Starting => "starting",
        LifecycleState::Running => "running",
        LifecycleState::Paused => "paused",
    }
}
