use log::Level;
use wasm_bindgen::JsValue;
use web_sys::console;

/// Route a formatted log line to the matching console method.
pub(crate) fn sink(level: Level, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        Level::Error => console::error_1(&line),
        Level::Warn => console::warn_1(&line),
        Level::Info => console::info_1(&line),
        Level::Debug | Level::Trace => console::debug_1(&line),
    }
}

/// Seconds since navigation start.
pub(crate) fn clock() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now() / 1000.0)
        .unwrap_or(0.0)
}
