//! Config persistence handle shared by every component that saves settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use toml_edit::{Array, DocumentMut, Item, value};
use tracing::{debug, warn};

use super::{Config, Theme, default_config_template, merge_at_path, write_config};
use crate::error::PersistenceError;

/// Handle to the config file on disk.
///
/// Every save is a read-merge-write round trip against the current file, not
/// a dump of in-memory state, so edits made outside the process and keys
/// written by newer versions survive. Saves are serialized on one lock so two
/// writers never read the same stale file and clobber each other.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store for the default config path.
    pub fn open_default() -> Self {
        Self::new(super::paths::config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and parses the config file.
    ///
    /// # Errors
    /// Fails if the file is missing or cannot be parsed. Callers treat this as
    /// fatal at startup.
    pub fn load(&self) -> Result<Config> {
        Config::load_from(&self.path)
    }

    /// Replaces or inserts the leaf at `path` and writes the file back.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the file cannot be read, parsed, merged or
    /// written. The file is left untouched in every failure case.
    pub fn merge_and_save(&self, path: &[&str], item: Item) -> Result<(), PersistenceError> {
        self.merge_all(vec![(path, item)])
    }

    /// Applies several leaf updates in a single read-merge-write round trip.
    ///
    /// # Errors
    /// Same as [`ConfigStore::merge_and_save`]; no update is written if any
    /// of them fails to merge.
    pub fn merge_all(&self, updates: Vec<(&[&str], Item)>) -> Result<(), PersistenceError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.merge_locked(updates).map_err(|source| {
            warn!(path = %self.path.display(), error = %format!("{source:#}"), "config save failed");
            PersistenceError::new(&self.path, source)
        })
    }

    fn merge_locked(&self, updates: Vec<(&[&str], Item)>) -> Result<()> {
        let contents = if self.path.exists() {
            fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read config from {}", self.path.display()))?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", self.path.display()))?;

        for (path, item) in updates {
            merge_at_path(&mut doc, path, item)
                .with_context(|| format!("Failed to update `{}`", path.join(".")))?;
            debug!(key = %path.join("."), "config leaf merged");
        }

        write_config(&self.path, &doc.to_string())
    }

    /// Persists a carousel's list and active index together.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the write fails.
    pub fn save_carousel(
        &self,
        section: &str,
        items: &[String],
        index: usize,
    ) -> Result<(), PersistenceError> {
        let list: Array = items.iter().map(String::as_str).collect();
        self.merge_all(vec![
            (&[section, "locations"][..], value(list)),
            (&[section, "current_location_index"][..], value(index as i64)),
        ])
    }

    /// Persists only the active carousel index.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the write fails.
    pub fn save_location_index(&self, section: &str, index: usize) -> Result<(), PersistenceError> {
        self.merge_and_save(&[section, "current_location_index"][..], value(index as i64))
    }

    /// Persists the theme name.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the write fails.
    pub fn save_theme(&self, theme: Theme) -> Result<(), PersistenceError> {
        self.merge_and_save(&["main_window", "theme"], value(theme.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use tempfile::tempdir;

    use super::*;
    use crate::config::WeatherConfig;

    const USER_CONFIG: &str = r#"# my dashboard
[main_window]
theme = "dark" # favourite
time_format = "12h"

[weather]
api_key = "secret"
locations = ["Paris", "Oslo"]
current_location_index = 0
radar_overlay = true

[future_plugin]
enabled = true
"#;

    #[test]
    fn test_merge_and_save_leaves_unrelated_sections_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, USER_CONFIG).unwrap();

        let store = ConfigStore::new(&path);
        store
            .merge_and_save(&["weather", "current_location_index"], value(1_i64))
            .unwrap();

        let out = fs::read_to_string(&path).unwrap();
        assert_eq!(
            out,
            USER_CONFIG.replace("current_location_index = 0", "current_location_index = 1")
        );
    }

    #[test]
    fn test_save_carousel_updates_list_and_index_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, USER_CONFIG).unwrap();

        let store = ConfigStore::new(&path);
        let items = vec!["Paris".to_string(), "Oslo".to_string(), "Lima".to_string()];
        store
            .save_carousel(WeatherConfig::SECTION, &items, 2)
            .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.weather.locations, items);
        assert_eq!(config.weather.current_location_index, 2);
        assert_eq!(config.weather.api_key.as_deref(), Some("secret"));

        let out = fs::read_to_string(&path).unwrap();
        assert!(out.contains("radar_overlay = true"));
        assert!(out.contains("[future_plugin]\nenabled = true"));
        assert!(out.contains("theme = \"dark\" # favourite"));
    }

    #[test]
    fn test_save_rereads_file_and_keeps_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, USER_CONFIG).unwrap();
        let store = ConfigStore::new(&path);

        // Someone edits the file while the dashboard is running.
        let edited = USER_CONFIG.replace("api_key = \"secret\"", "api_key = \"rotated\"");
        fs::write(&path, &edited).unwrap();

        store.save_theme(Theme::Green).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("rotated"));
        assert_eq!(config.main_window.theme(), Theme::Green);
    }

    #[test]
    fn test_save_creates_file_from_template_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let store = ConfigStore::new(&path);

        store.save_theme(Theme::Light).unwrap();

        let out = fs::read_to_string(&path).unwrap();
        assert!(out.contains("# Dashboard Configuration"));
        assert_eq!(store.load().unwrap().main_window.theme(), Theme::Light);
    }

    #[test]
    fn test_unparsable_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[weather\nbroken").unwrap();
        let store = ConfigStore::new(&path);

        let err = store.save_theme(Theme::Dark).unwrap_err();
        assert_eq!(err.path, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "[weather\nbroken");
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("config.toml");
        fs::create_dir_all(&path).unwrap();
        let store = ConfigStore::new(&path);

        assert!(store.save_location_index("weather", 1).is_err());
    }

    #[test]
    fn test_concurrent_saves_do_not_clobber_each_other() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, USER_CONFIG).unwrap();
        let store = Arc::new(ConfigStore::new(&path));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let key = format!("key_{i}");
                    store
                        .merge_and_save(&["future_plugin", key.as_str()], value(i64::from(i)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let out = fs::read_to_string(&path).unwrap();
        for i in 0..8 {
            assert!(out.contains(&format!("key_{i} = {i}")), "missing key_{i}:\n{out}");
        }
    }
}
