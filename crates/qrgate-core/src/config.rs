//! JSON configuration for the scanner.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constraints::{ConstraintSet, FallbackPlan, Resolution};
use crate::frame::{DecodeOptions, Inversion};
use crate::messages::Messages;
use crate::validate::UrlPolicy;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_start_delay_ms() -> u64 {
    500
}

fn default_pause_ms() -> u64 {
    3000
}

fn default_notice_ms() -> u64 {
    2000
}

/// Scanner behaviour knobs. Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Delay between a passed capability check and the first start.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
    /// How long a rejected payload keeps scanning paused.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    /// How long a transient torch notice stays on screen.
    #[serde(default = "default_notice_ms")]
    pub notice_ms: u64,
    #[serde(default)]
    pub url_policy: UrlPolicy,
    #[serde(default)]
    pub fallback: FallbackPlan,
    #[serde(default)]
    pub ideal_resolution: Option<Resolution>,
    #[serde(default)]
    pub inversion: Inversion,
    #[serde(default)]
    pub messages: Messages,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: default_start_delay_ms(),
            pause_ms: default_pause_ms(),
            notice_ms: default_notice_ms(),
            url_policy: UrlPolicy::default(),
            fallback: FallbackPlan::default(),
            ideal_resolution: None,
            inversion: Inversion::default(),
            messages: Messages::default(),
        }
    }
}

impl ScannerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn notice(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    /// Constraint sets to try, most preferred first.
    pub fn constraint_plan(&self) -> Vec<ConstraintSet> {
        self.fallback.constraint_sets(self.ideal_resolution)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            inversion: self.inversion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = ScannerConfig::from_json_str("{}").expect("parse");
        assert_eq!(cfg, ScannerConfig::default());
        assert_eq!(cfg.pause(), Duration::from_secs(3));
        assert_eq!(cfg.notice(), Duration::from_secs(2));
        assert_eq!(cfg.constraint_plan().len(), 3);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = ScannerConfig::from_json_str(
            r#"{
                "url_policy": "permissive",
                "fallback": "minimal",
                "inversion": "attempt_both",
                "ideal_resolution": { "width": 640, "height": 480 },
                "messages": { "prompt": "Scan" }
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.url_policy, UrlPolicy::Permissive);
        assert_eq!(cfg.constraint_plan().len(), 1);
        assert_eq!(cfg.decode_options().inversion, Inversion::AttemptBoth);
        assert_eq!(cfg.messages.prompt, "Scan");
        assert_eq!(cfg.start_delay_ms, 500);
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanner.json");
        let cfg = ScannerConfig {
            pause_ms: 1500,
            ..ScannerConfig::default()
        };
        cfg.write_json(&path).expect("write");
        assert_eq!(ScannerConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = ScannerConfig::from_json_str("{\"pause_ms\": \"soon\"}").expect_err("bad");
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
