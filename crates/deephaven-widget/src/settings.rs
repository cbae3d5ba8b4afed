//! Widget settings.
//!
//! Settings are stored in a JSON file in the user's config directory:
//! - macOS: ~/Library/Application Support/deephaven-widget/settings.json
//! - Linux: ~/.config/deephaven-widget/settings.json
//! - Windows: C:\Users\<User>\AppData\Roaming\deephaven-widget\settings.json
//!
//! The `DEEPHAVEN_IPY_URL` environment variable takes precedence over the
//! file's `server_url`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Environment variable forcing the server base URL.
pub const URL_OVERRIDE_ENV: &str = "DEEPHAVEN_IPY_URL";

pub const DEFAULT_WIDTH: u32 = 0;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Persistent widget preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Iframe width in pixels; 0 takes the full output width.
    #[serde(default = "default_width")]
    pub default_width: u32,

    /// Iframe height in pixels.
    #[serde(default = "default_height")]
    pub default_height: u32,

    /// Base URL used instead of the resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            server_url: None,
        }
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        let path = settings_path();
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("[settings] Ignoring {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Write settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Effective explicit URL override, reading the process environment.
    pub fn url_override(&self) -> Option<String> {
        self.url_override_with(std::env::var(URL_OVERRIDE_ENV).ok())
    }

    /// Effective explicit URL override given the environment variable's value.
    pub fn url_override_with(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|url| !url.is_empty())
            .or_else(|| self.server_url.clone())
    }
}

/// Path of the settings file.
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deephaven-widget")
        .join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_width, 0);
        assert_eq!(settings.default_height, 600);
        assert_eq!(settings.server_url, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"default_height": 400}"#).unwrap();
        assert_eq!(settings.default_height, 400);
        assert_eq!(settings.default_width, 0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            default_width: 800,
            default_height: 300,
            server_url: Some("https://dh.example/".to_string()),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_env_override_precedence() {
        let settings = Settings {
            server_url: Some("https://file.example/".to_string()),
            ..Settings::default()
        };
        assert_eq!(
            settings.url_override_with(Some("https://env.example/".to_string())),
            Some("https://env.example/".to_string())
        );
        assert_eq!(
            settings.url_override_with(None),
            Some("https://file.example/".to_string())
        );
        assert_eq!(
            settings.url_override_with(Some(String::new())),
            Some("https://file.example/".to_string())
        );
        assert_eq!(Settings::default().url_override_with(None), None);
    }

    #[test]
    fn test_settings_path() {
        let path = settings_path();
        assert!(path.to_string_lossy().contains("deephaven-widget"));
        assert!(path.ends_with("settings.json"));
    }
}
