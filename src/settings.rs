use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::timeline::{sanitize_day_width, DEFAULT_DAY_WIDTH};
use crate::model::FallbackPolicy;

const SETTINGS_FILE: &str = "settings.json";

/// Persisted user settings (lives in the OS config directory).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Pixels per day at the default zoom.
    pub day_width: f32,
    /// How records with missing or unparseable dates are treated.
    pub fallback_policy: FallbackPolicy,
    pub show_today_marker: bool,
    /// Reopened on start-up when present.
    pub last_file: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            day_width: DEFAULT_DAY_WIDTH,
            fallback_policy: FallbackPolicy::default(),
            show_today_marker: true,
            last_file: None,
        }
    }
}

impl AppSettings {
    /// Directory holding the settings file, `.` if the OS gives us none.
    pub fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "Taskline")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Read settings, falling back to defaults if the file is missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&json) {
            Ok(mut settings) => {
                settings.day_width = sanitize_day_width(settings.day_width);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}
