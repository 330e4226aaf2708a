//! Configuration management for the dashboard.
//!
//! Loads configuration from ${DASHBOARD_HOME}/config.toml. Unlike most
//! settings files there is no usable default (the weather panel needs a key
//! and locations), so a missing or broken file is a startup error.
//!
//! Writes never serialize `Config` back out. They go through [`ConfigStore`],
//! which re-reads the file and merges single leaves with `toml_edit` so that
//! comments, ordering and keys this build does not know about survive.

mod merge;
mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use merge::merge_at_path;
pub use store::ConfigStore;

/// Returns the default config template.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../../default_config.toml")
}

pub mod paths {
    //! Path resolution for dashboard configuration and data directories.
    //!
    //! DASHBOARD_HOME resolution order:
    //! 1. DASHBOARD_HOME environment variable (if set)
    //! 2. ~/.config/dashboard (default)

    use std::path::PathBuf;

    /// Returns the dashboard home directory.
    pub fn dashboard_home() -> PathBuf {
        if let Ok(home) = std::env::var("DASHBOARD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("dashboard"))
            .unwrap_or_else(|| PathBuf::from(".dashboard"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        dashboard_home().join("config.toml")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        dashboard_home().join("logs")
    }

    /// Returns the default notification spool directory.
    pub fn notifications_dir() -> PathBuf {
        dashboard_home().join("notifications")
    }
}

/// Color theme names understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
    Green,
}

impl Theme {
    pub fn all() -> &'static [Theme] {
        &[Theme::Default, Theme::Dark, Theme::Light, Theme::Green]
    }

    /// Parses a theme name case-insensitively. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Theme> {
        Self::all()
            .iter()
            .copied()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Green => "green",
        }
    }

    /// Next theme in the cycle, wrapping around.
    pub fn next(self) -> Theme {
        let all = Self::all();
        let pos = all.iter().position(|t| *t == self).unwrap_or(0);
        all[(pos + 1) % all.len()]
    }
}

/// Header clock format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "12h")]
    H12,
}

impl TimeFormat {
    /// `chrono` format string for the header clock.
    pub fn clock_format(self) -> &'static str {
        match self {
            TimeFormat::H24 => "%H:%M",
            TimeFormat::H12 => "%-I:%M %p",
        }
    }
}

/// Main window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MainWindowConfig {
    pub ui_refresh_interval_secs: u64,
    pub show_last_update_in_header: bool,
    /// Theme name; unknown names fall back to the default theme.
    pub theme: String,
    pub time_format: TimeFormat,
}

impl MainWindowConfig {
    pub fn theme(&self) -> Theme {
        Theme::parse(&self.theme).unwrap_or_default()
    }
}

impl Default for MainWindowConfig {
    fn default() -> Self {
        Self {
            ui_refresh_interval_secs: 15,
            show_last_update_in_header: true,
            theme: Theme::Default.as_str().to_string(),
            time_format: TimeFormat::default(),
        }
    }
}

/// Weather panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub locations: Vec<String>,
    pub current_location_index: usize,
    pub refresh_interval_secs: u64,
    pub forecast_days: u8,
}

impl WeatherConfig {
    pub const SECTION: &'static str = "weather";

    /// Resolves the API key with precedence: config > `WEATHER_API_KEY` env.
    pub fn effective_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref() {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }

        std::env::var("WEATHER_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Returns the configured base URL, treating empty strings as unset.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            locations: vec!["auto:ip".to_string()],
            current_location_index: 0,
            refresh_interval_secs: 600,
            forecast_days: 3,
        }
    }
}

/// Notifications panel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub display_count: usize,
    pub refresh_interval_secs: u64,
    pub spool_dir: Option<PathBuf>,
}

impl NotificationsConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn effective_spool_dir(&self) -> PathBuf {
        self.spool_dir
            .clone()
            .unwrap_or_else(paths::notifications_dir)
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            display_count: 5,
            refresh_interval_secs: 30,
            spool_dir: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub main_window: MainWindowConfig,
    pub weather: WeatherConfig,
    pub notifications: NotificationsConfig,
}

impl Config {
    /// Loads configuration from a specific path.
    ///
    /// A missing file is an error: there is no configuration to fall back to.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at {}. Run `dashboard config init` to create one.",
                path.display()
            );
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        write_config(path, default_config_template())
    }
}

/// Writes config content to a file, creating parent directories as needed.
/// Uses atomic write (temp file + rename) to prevent corruption.
fn write_config(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
