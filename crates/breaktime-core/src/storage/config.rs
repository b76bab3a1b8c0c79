//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The Custom technique's interval and break length
//! - Whether the overlay and the break sound are enabled
//! - Scheduler tick cadence
//!
//! Configuration is stored at `~/.config/breaktime/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::runtime::RuntimeConfig;
use crate::services::{secs_to_duration, SettingsStore};
use crate::timer::TICK_INTERVAL_MS;

/// Parameters of the Custom technique. Unset means "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConfig {
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub break_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breaktime/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Technique used by `breaktime run` when none is given.
    #[serde(default)]
    pub default_technique: Option<String>,
    #[serde(default)]
    pub custom: CustomConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_true() -> bool {
    true
}
fn default_tick_interval_ms() -> u64 {
    TICK_INTERVAL_MS
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Replace the leaf at `key`, parsing `value` to match what is there.
    ///
    /// `none` clears a value; unset optional leaves accept numbers, booleans
    /// or strings.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = if value.eq_ignore_ascii_case("none") {
                serde_json::Value::Null
            } else {
                match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(b) = value.parse::<bool>() {
                            serde_json::Value::Bool(b)
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot assign to a section".into()));
                    }
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                }
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing the defaults there when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some("none".to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            tick_interval: StdDuration::from_millis(self.scheduler.tick_interval_ms),
            ..RuntimeConfig::default()
        }
    }
}

impl SettingsStore for Config {
    fn custom_interval(&self) -> Option<Duration> {
        secs_to_duration(self.custom.interval_secs)
    }

    fn custom_break_duration(&self) -> Option<Duration> {
        secs_to_duration(self.custom.break_secs)
    }

    fn is_overlay_enabled(&self) -> bool {
        self.overlay.enabled
    }

    fn is_sound_enabled(&self) -> bool {
        self.sound.enabled
    }
}
