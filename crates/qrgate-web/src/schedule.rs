use std::rc::Weak;
use std::time::Duration;

use qrgate_core::{Scheduler, Timer};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::App;

/// `requestAnimationFrame` and `setTimeout`, dispatching back into the app.
///
/// Holds a weak handle so pending callbacks do not keep an unmounted scanner
/// alive.
pub struct WebScheduler {
    window: Window,
    app: Weak<App>,
}

impl WebScheduler {
    pub(crate) fn new(window: Window, app: Weak<App>) -> Self {
        Self { window, app }
    }
}

impl Scheduler for WebScheduler {
    fn request_frame(&mut self) {
        let app = self.app.clone();
        let callback = Closure::once_into_js(move |_timestamp: f64| {
            if let Some(app) = app.upgrade() {
                app.frame();
            }
        });
        if let Err(err) = self.window.request_animation_frame(callback.unchecked_ref()) {
            log::error!("requestAnimationFrame failed: {:?}", err);
        }
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let app = self.app.clone();
        let callback = Closure::once_into_js(move || {
            if let Some(app) = app.upgrade() {
                app.timer(timer);
            }
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let scheduled = self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            millis,
        );
        if let Err(err) = scheduled {
            log::error!("setTimeout failed for {timer:?}: {:?}", err);
        }
    }
}
