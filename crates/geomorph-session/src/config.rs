//! Configuration for the GeoMorph session runtime.
//!
//! Settings are read from `geomorph.json` (camelCase keys). A missing file
//! yields the defaults; a present file is parsed and then validated.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GeomorphError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "geomorph.json";

/// Default evaluator API root.
fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

/// Default topic requested from the question feed.
fn default_topic() -> String {
    "geometry".to_string()
}

/// Default intervention monitor period in milliseconds.
const fn default_monitor_interval_ms() -> u64 {
    3000
}

/// Default affect sampling period in milliseconds.
const fn default_affect_interval_ms() -> u64 {
    5000
}

/// Default delay between a submission and the next question.
const fn default_transition_delay_ms() -> u64 {
    1500
}

/// Default toast lifetime in milliseconds.
const fn default_toast_duration_ms() -> u64 {
    4000
}

/// Default toast exit transition in milliseconds.
const fn default_toast_exit_ms() -> u64 {
    300
}

/// Default per-request HTTP timeout in milliseconds.
const fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Labels substituted when affect inference fails.
fn default_fallback_emotions() -> Vec<String> {
    ["happy", "neutral", "confused", "neutral"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Main configuration for a tutoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Root URL of the evaluator API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent when loading the current session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Topic requested for every question.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Intervention monitor period.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// Affect sampling period.
    #[serde(default = "default_affect_interval_ms")]
    pub affect_interval_ms: u64,

    /// Time between a submission and the next question fetch.
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,

    /// How long a toast stays on screen.
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,

    /// Exit transition before a toast is removed.
    #[serde(default = "default_toast_exit_ms")]
    pub toast_exit_ms: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Labels picked at random when affect inference fails.
    #[serde(default = "default_fallback_emotions")]
    pub fallback_emotions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_token: None,
            topic: default_topic(),
            monitor_interval_ms: default_monitor_interval_ms(),
            affect_interval_ms: default_affect_interval_ms(),
            transition_delay_ms: default_transition_delay_ms(),
            toast_duration_ms: default_toast_duration_ms(),
            toast_exit_ms: default_toast_exit_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            fallback_emotions: default_fallback_emotions(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `geomorph.json` in the current directory. If not found,
    /// returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            GeomorphError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `geomorph.json` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GeomorphError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON, and `GeomorphError::ConfigValidationError` if a
    /// value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(GeomorphError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GeomorphError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `GeomorphError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(GeomorphError::config_validation(
                "apiBaseUrl must not be empty",
                "Set apiBaseUrl to the evaluator root, e.g. http://localhost:8000/api/v1",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(GeomorphError::config_validation(
                format!("apiBaseUrl '{url}' is not an http(s) URL"),
                "Prefix apiBaseUrl with http:// or https://",
            ));
        }

        if self.topic.trim().is_empty() {
            return Err(GeomorphError::config_validation(
                "topic must not be empty",
                "Set topic in your geomorph.json (e.g. \"geometry\")",
            ));
        }

        let durations = [
            ("monitorIntervalMs", self.monitor_interval_ms),
            ("affectIntervalMs", self.affect_interval_ms),
            ("transitionDelayMs", self.transition_delay_ms),
            ("toastDurationMs", self.toast_duration_ms),
            ("toastExitMs", self.toast_exit_ms),
            ("requestTimeoutMs", self.request_timeout_ms),
        ];
        if let Some((key, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(GeomorphError::config_validation(
                format!("{key} must be greater than 0"),
                format!("Set {key} to at least 1 in your geomorph.json"),
            ));
        }

        if self.fallback_emotions.iter().all(|e| e.trim().is_empty()) {
            return Err(GeomorphError::config_validation(
                "fallbackEmotions must contain at least one label",
                "List one or more labels, e.g. [\"neutral\"]",
            ));
        }

        Ok(())
    }

    /// API root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Intervention monitor period.
    #[must_use]
    pub const fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Affect sampling period.
    #[must_use]
    pub const fn affect_interval(&self) -> Duration {
        Duration::from_millis(self.affect_interval_ms)
    }

    /// Submission transition window.
    #[must_use]
    pub const fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// Toast lifetime.
    #[must_use]
    pub const fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Toast exit transition.
    #[must_use]
    pub const fn toast_exit(&self) -> Duration {
        Duration::from_millis(self.toast_exit_ms)
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
