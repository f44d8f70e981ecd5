//! Notifier settings.
//!
//! Resolution order: built-in defaults, then an optional JSON file, then
//! `FINDERID_*` environment variables (a `.env` file is honored).

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::directory::RestDirectoryConfig;
use crate::notification::DEFAULT_CAPACITY;

pub const ENV_CAPACITY: &str = "FINDERID_NOTIFICATION_CAPACITY";
pub const ENV_TOAST_DURATION_MS: &str = "FINDERID_TOAST_DURATION_MS";
pub const ENV_FALLBACK_SENDER: &str = "FINDERID_FALLBACK_SENDER";
pub const ENV_ICON: &str = "FINDERID_NOTIFICATION_ICON";
pub const ENV_SOUND_ENABLED: &str = "FINDERID_SOUND_ENABLED";
pub const ENV_DIRECTORY_URL: &str = "FINDERID_DIRECTORY_URL";
pub const ENV_DIRECTORY_API_KEY: &str = "FINDERID_DIRECTORY_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifierSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
    #[serde(default = "default_fallback_sender")]
    pub fallback_sender: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,
    #[serde(default)]
    pub directory_url: Option<String>,
    #[serde(default)]
    pub directory_api_key: Option<String>,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_toast_duration_ms() -> u64 {
    6_000
}

fn default_fallback_sender() -> String {
    "Un visiteur".to_string()
}

fn default_icon() -> String {
    "/favicon.ico".to_string()
}

fn default_sound_enabled() -> bool {
    true
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            toast_duration_ms: default_toast_duration_ms(),
            fallback_sender: default_fallback_sender(),
            icon: default_icon(),
            sound_enabled: default_sound_enabled(),
            directory_url: None,
            directory_api_key: None,
        }
    }
}

impl NotifierSettings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!(error = %error, "ignoring unreadable .env file");
            }
        }
        let mut settings = Self::default();
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply overrides from `lookup` (an environment-like key/value source).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(raw) = get(ENV_CAPACITY) {
            self.capacity = parse_value(ENV_CAPACITY, &raw)?;
        }
        if let Some(raw) = get(ENV_TOAST_DURATION_MS) {
            self.toast_duration_ms = parse_value(ENV_TOAST_DURATION_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_FALLBACK_SENDER) {
            self.fallback_sender = raw;
        }
        if let Some(raw) = get(ENV_ICON) {
            self.icon = raw;
        }
        if let Some(raw) = get(ENV_SOUND_ENABLED) {
            self.sound_enabled = parse_bool(ENV_SOUND_ENABLED, &raw)?;
        }
        if let Some(raw) = get(ENV_DIRECTORY_URL) {
            self.directory_url = Some(raw);
        }
        if let Some(raw) = get(ENV_DIRECTORY_API_KEY) {
            self.directory_api_key = Some(raw);
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "capacity",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.toast_duration_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "toastDurationMs",
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// REST directory settings, when both url and key are configured.
    pub fn directory(&self) -> Option<RestDirectoryConfig> {
        match (&self.directory_url, &self.directory_api_key) {
            (Some(base_url), Some(api_key)) => Some(RestDirectoryConfig {
                base_url: base_url.clone(),
                api_key: api_key.clone(),
                timeout_ms: 5_000,
            }),
            _ => None,
        }
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        message: format!("{raw:?}: {e}"),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            message: format!("{raw:?} is not a boolean"),
        }),
    }
}
