use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Scalar key/value storage that survives restarts
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for Box<P> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Preferences kept as a flat JSON object on disk
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// `<config_dir>/aphator/preferences.json`
    pub fn open_default() -> Result<Self> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Self::open(config_dir.join("aphator").join("preferences.json"))
    }

    /// A file that does not parse is treated as empty and replaced on the next `set`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "discarding unreadable preferences");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The current theme and the store it is persisted to.
///
/// Only `toggle` changes the theme after startup.
pub struct ThemeToggle<P> {
    store: P,
    current: Theme,
}

impl<P: PreferenceStore> ThemeToggle<P> {
    pub fn load_on_startup(store: P, default: Theme) -> Self {
        let current = match store.get(THEME_KEY) {
            Some(saved) => Theme::from_str(&saved).unwrap_or_else(|| {
                warn!(value = %saved, "ignoring unrecognised saved theme");
                default
            }),
            None => default,
        };
        Self { store, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        match self.store.set(THEME_KEY, self.current.as_str()) {
            Ok(()) => info!(theme = self.current.as_str(), "theme changed"),
            Err(err) => warn!(error = %err, "could not persist theme"),
        }
        self.current
    }

    pub fn into_store(self) -> P {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_absent_value_keeps_default() {
        let toggle = ThemeToggle::load_on_startup(MemoryStore::default(), Theme::Dark);
        assert_eq!(toggle.current(), Theme::Dark);
    }

    #[test]
    fn test_saved_value_is_applied() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "light").unwrap();
        let toggle = ThemeToggle::load_on_startup(store, Theme::Dark);
        assert_eq!(toggle.current(), Theme::Light);
    }

    #[test]
    fn test_unrecognised_value_keeps_default() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "sepia").unwrap();
        let toggle = ThemeToggle::load_on_startup(store, Theme::Light);
        assert_eq!(toggle.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_twice_restores_persisted_value() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "dark").unwrap();
        let mut toggle = ThemeToggle::load_on_startup(store, Theme::Dark);

        assert_eq!(toggle.toggle(), Theme::Light);
        assert_eq!(toggle.toggle(), Theme::Dark);

        let store = toggle.into_store();
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_toggle_survives_fresh_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aphator").join("preferences.json");

        let mut toggle =
            ThemeToggle::load_on_startup(FileStore::open(&path).unwrap(), Theme::Dark);
        toggle.toggle();
        drop(toggle);

        let reopened = ThemeToggle::load_on_startup(FileStore::open(&path).unwrap(), Theme::Dark);
        assert_eq!(reopened.current(), Theme::Light);
    }

    #[test]
    fn test_corrupt_preferences_fall_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ truncated").unwrap();

        let store = FileStore::open(&path).unwrap();
        let mut toggle = ThemeToggle::load_on_startup(store, Theme::Dark);
        assert_eq!(toggle.current(), Theme::Dark);

        toggle.toggle();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{ "font": "mono" }"#).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        store.set(THEME_KEY, "light").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("font").as_deref(), Some("mono"));
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(reopened.path(), path.as_path());
    }
}
