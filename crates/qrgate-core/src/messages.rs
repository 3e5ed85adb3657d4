//! User-facing status texts.

use serde::{Deserialize, Serialize};

/// Every string the scanner writes to the status surface.
///
/// `found` may contain `{url}` and `camera_other` may contain `{error}`;
/// both placeholders are substituted when the message is shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub unsupported: String,
    pub accessing: String,
    pub prompt: String,
    pub camera_denied: String,
    pub camera_missing: String,
    pub camera_busy: String,
    pub camera_overconstrained: String,
    pub camera_other: String,
    pub playback_failed: String,
    pub torch_unavailable: String,
    pub torch_failed: String,
    pub found: String,
    pub rejected: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            unsupported: "Your browser does not support camera access. \
                Please use Chrome, Firefox or Safari."
                .into(),
            accessing: "Accessing camera...".into(),
            prompt: "Point your camera at a QR code".into(),
            camera_denied:
                "Camera access denied. Please grant camera permissions and refresh.".into(),
            camera_missing: "No camera found on this device.".into(),
            camera_busy: "Camera is already in use or not readable.".into(),
            camera_overconstrained:
                "Camera constraints cannot be satisfied. Please use a different browser.".into(),
            camera_other: "Camera error: {error}".into(),
            playback_failed: "Error starting video. Please refresh and try again.".into(),
            torch_unavailable: "Flash not available on this device".into(),
            torch_failed: "Flash control not available".into(),
            found: "Found URL: {url}\nRedirecting...".into(),
            rejected: "UNAUTHORIZED REQUEST: QR code does not contain a valid URL".into(),
        }
    }
}

impl Messages {
    pub fn found(&self, url: &str) -> String {
        self.found.replace("{url}", url)
    }

    pub fn camera_other(&self, error: &str) -> String {
        let error = if error.is_empty() {
            "Unknown error"
        } else {
            error
        };
        self.camera_other.replace("{error}", error)
    }
}
