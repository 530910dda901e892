//! Runtime settings, resolved from environment variables.
//!
//! `run()` loads `.env.local` / `.env` first, so every value here can
//! live in a dotenv file. Unset variables fall back to defaults; set
//! but unparsable ones are an error naming the variable.

use crate::trigger::{parse_key, PollerConfig};
use device_query::Keycode;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORAGE_DIR: &str = "AUTOSCREEN_STORAGE_DIR";
pub const ENV_BIND: &str = "AUTOSCREEN_BIND";
pub const ENV_TRIGGER_KEY: &str = "AUTOSCREEN_TRIGGER_KEY";
pub const ENV_POLL_MS: &str = "AUTOSCREEN_POLL_MS";
pub const ENV_DEBOUNCE_MS: &str = "AUTOSCREEN_DEBOUNCE_MS";
pub const ENV_ARCHIVE: &str = "AUTOSCREEN_ARCHIVE";

const DEFAULT_BIND: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the generated documents.
    pub storage_dir: PathBuf,
    pub bind: SocketAddr,
    pub poller: PollerConfig,
    /// Keep a PNG copy of every capture under `storage_dir/screenshots`.
    pub archive_screenshots: bool,
}

impl Settings {
    /// Defaults rooted at `storage_dir`; handy for tests and embedding.
    pub fn with_storage_dir(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            poller: PollerConfig::default(),
            archive_screenshots: true,
        }
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_dir = lookup(ENV_STORAGE_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);

        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| SettingsError::invalid(ENV_BIND, &bind_raw))?;

        let defaults = PollerConfig::default();
        let key = match lookup(ENV_TRIGGER_KEY) {
            Some(raw) => parse_key(&raw).ok_or_else(|| SettingsError::invalid(ENV_TRIGGER_KEY, &raw))?,
            None => defaults.key,
        };
        let poll_interval = millis(&lookup, ENV_POLL_MS)?.unwrap_or(defaults.poll_interval);
        let debounce = millis(&lookup, ENV_DEBOUNCE_MS)?.unwrap_or(defaults.debounce);

        let archive_screenshots = match lookup(ENV_ARCHIVE) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| SettingsError::invalid(ENV_ARCHIVE, &raw))?,
            None => true,
        };

        Ok(Self {
            storage_dir,
            bind,
            poller: PollerConfig {
                key,
                poll_interval,
                debounce,
            },
            archive_screenshots,
        })
    }

    pub fn trigger_key(&self) -> Keycode {
        self.poller.key
    }

    /// Where archived screenshots go, if archiving is on.
    pub fn archive_dir(&self) -> Option<PathBuf> {
        self.archive_screenshots
            .then(|| self.storage_dir.join("screenshots"))
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("autoscreen"))
        .unwrap_or_else(|| PathBuf::from("media"))
}

fn millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| SettingsError::invalid(key, &raw)),
        None => Ok(None),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

impl SettingsError {
    fn invalid(key: &str, value: &str) -> Self {
        SettingsError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = from_map(&[]).unwrap();
        assert_eq!(settings.bind.to_string(), DEFAULT_BIND);
        assert_eq!(settings.trigger_key(), Keycode::Right);
        assert_eq!(settings.poller.poll_interval, Duration::from_millis(100));
        assert_eq!(settings.poller.debounce, Duration::from_millis(500));
        assert!(settings.archive_screenshots);
    }

    #[test]
    fn reads_every_variable() {
        let settings = from_map(&[
            (ENV_STORAGE_DIR, "/tmp/autoscreen-docs"),
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_TRIGGER_KEY, "F9"),
            (ENV_POLL_MS, "25"),
            (ENV_DEBOUNCE_MS, "750"),
            (ENV_ARCHIVE, "off"),
        ])
        .unwrap();

        assert_eq!(settings.storage_dir, PathBuf::from("/tmp/autoscreen-docs"));
        assert_eq!(settings.bind.port(), 9000);
        assert_eq!(settings.trigger_key(), Keycode::F9);
        assert_eq!(settings.poller.poll_interval, Duration::from_millis(25));
        assert_eq!(settings.poller.debounce, Duration::from_millis(750));
        assert!(settings.archive_dir().is_none());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = from_map(&[(ENV_POLL_MS, "fast")]).unwrap_err();
        assert!(err.to_string().contains(ENV_POLL_MS));

        let err = from_map(&[(ENV_TRIGGER_KEY, "hyper")]).unwrap_err();
        assert!(err.to_string().contains(ENV_TRIGGER_KEY));

        assert!(from_map(&[(ENV_BIND, "not-an-addr")]).is_err());
        assert!(from_map(&[(ENV_ARCHIVE, "maybe")]).is_err());
    }

    #[test]
    fn archive_dir_sits_under_storage() {
        let settings = Settings::with_storage_dir("/data/docs");
        assert_eq!(
            settings.archive_dir(),
            Some(PathBuf::from("/data/docs/screenshots"))
        );
    }
}
