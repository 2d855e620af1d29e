//! Persisted user preferences: settings, saved locations, search history and
//! the last location looked up.
//!
//! Each concern lives in its own JSON file under the config directory, so
//! clearing one never touches the others.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, WxError};
use crate::units::TemperatureUnit;

pub const HISTORY_LIMIT: usize = 10;

const SETTINGS_FILE: &str = "settings.json";
const LOCATIONS_FILE: &str = "locations.json";
const HISTORY_FILE: &str = "history.json";
const LAST_LOCATION_FILE: &str = "last_location.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum RefreshInterval {
    #[serde(rename = "15")]
    #[value(name = "15")]
    Fifteen,
    #[default]
    #[serde(rename = "30")]
    #[value(name = "30")]
    Thirty,
    #[serde(rename = "60")]
    #[value(name = "60")]
    Sixty,
}

impl RefreshInterval {
    pub fn minutes(&self) -> u64 {
        match self {
            RefreshInterval::Fifteen => 15,
            RefreshInterval::Thirty => 30,
            RefreshInterval::Sixty => 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_unit: TemperatureUnit,
    pub auto_refresh: bool,
    pub refresh_interval: RefreshInterval,
    pub save_search_history: bool,
    pub save_locations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_unit: TemperatureUnit::Celsius,
            auto_refresh: false,
            refresh_interval: RefreshInterval::Thirty,
            save_search_history: true,
            save_locations: true,
        }
    }
}

/// File-backed preference store rooted at a directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/wx`, or `./wx` when the platform has no config dir.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wx")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings(&self) -> Result<Settings> {
        self.read(SETTINGS_FILE)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write(SETTINGS_FILE, settings)
    }

    pub fn saved_locations(&self) -> Result<Vec<String>> {
        self.read(LOCATIONS_FILE)
    }

    /// Appends `location` unless it is already saved. Returns whether the
    /// list changed.
    pub fn save_location(&self, location: &str) -> Result<bool> {
        let location = location.trim();
        if location.is_empty() || !self.settings()?.save_locations {
            return Ok(false);
        }

        let mut locations = self.saved_locations()?;
        if locations.iter().any(|l| l == location) {
            return Ok(false);
        }
        locations.push(location.to_string());
        self.write(LOCATIONS_FILE, &locations)?;
        Ok(true)
    }

    pub fn remove_location(&self, location: &str) -> Result<bool> {
        let mut locations = self.saved_locations()?;
        let before = locations.len();
        locations.retain(|l| l != location);
        if locations.len() == before {
            return Ok(false);
        }
        self.write(LOCATIONS_FILE, &locations)?;
        Ok(true)
    }

    /// Most recent first.
    pub fn history(&self) -> Result<Vec<String>> {
        self.read(HISTORY_FILE)
    }

    /// Moves `location` to the front of the history, keeping at most
    /// [`HISTORY_LIMIT`] entries.
    pub fn record_search(&self, location: &str) -> Result<()> {
        let location = location.trim();
        if location.is_empty() || !self.settings()?.save_search_history {
            return Ok(());
        }

        let mut history = self.history()?;
        history.retain(|l| l != location);
        history.insert(0, location.to_string());
        history.truncate(HISTORY_LIMIT);
        self.write(HISTORY_FILE, &history)
    }

    pub fn remove_from_history(&self, location: &str) -> Result<bool> {
        let mut history = self.history()?;
        let before = history.len();
        history.retain(|l| l != location);
        if history.len() == before {
            return Ok(false);
        }
        self.write(HISTORY_FILE, &history)?;
        Ok(true)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.remove(HISTORY_FILE)
    }

    pub fn last_location(&self) -> Result<Option<String>> {
        self.read(LAST_LOCATION_FILE)
    }

    pub fn set_last_location(&self, location: &str) -> Result<()> {
        self.write(LAST_LOCATION_FILE, &Some(location))
    }

    /// Resets settings, saved locations and history to their defaults.
    pub fn clear_all(&self) -> Result<()> {
        info!(dir = %self.dir.display(), "clearing all preferences");
        for file in [SETTINGS_FILE, LOCATIONS_FILE, HISTORY_FILE] {
            self.remove(file)?;
        }
        Ok(())
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&contents).map_err(|source| WxError::Store { path, source })
    }

    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        debug!(path = %path.display(), "writing preferences");
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<()> {
        match fs::remove_file(self.dir.join(file)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
