use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::keybindings::{allowed_chars, excluded_keys_pattern};
use crate::nav::error::{NavError, Result};

fn default_excluded_keys() -> String {
    "Dr".to_string()
}

fn default_visual_aid() -> bool {
    true
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Characters whose keystrokes are never intercepted, e.g. "Dr"
    #[serde(default = "default_excluded_keys")]
    pub excluded_keys: String,
    /// Reveal an already-open file instead of opening it again
    #[serde(default)]
    pub prevent_duplicate_opens: bool,
    /// Flash the tab header when the revealed tab was already in front
    #[serde(default = "default_visual_aid")]
    pub background_open_visual_aid: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excluded_keys: default_excluded_keys(),
            prevent_duplicate_opens: false,
            background_open_visual_aid: default_visual_aid(),
        }
    }
}

/// Check an excluded-keys value: only bound characters, none repeated.
pub fn validate_excluded_keys(value: &str) -> Result<()> {
    let pattern = excluded_keys_pattern()?;
    if !pattern.is_match(value) {
        return Err(NavError::InvalidExcludedKeys {
            value: value.to_string(),
            reason: format!("only these characters are allowed: {}", allowed_chars()),
        });
    }
    let mut seen = HashSet::new();
    if let Some(dup) = value.chars().find(|ch| !seen.insert(*ch)) {
        return Err(NavError::InvalidExcludedKeys {
            value: value.to_string(),
            reason: format!("'{}' appears more than once", dup),
        });
    }
    Ok(())
}

impl Settings {
    /// Returns the config directory path (~/.treenav)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".treenav"))
    }

    /// Returns the config file path (~/.treenav/settings.json)
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.json"))
    }

    /// Loads settings from the config file with error information
    pub fn load_with_error() -> std::result::Result<Self, String> {
        let config_path = Self::config_path()
            .ok_or_else(|| "Could not determine config path".to_string())?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> std::result::Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;

        let mut settings: Settings = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in settings.json: {}", e))?;

        // A hand-edited file must not smuggle in an unusable value
        if validate_excluded_keys(&settings.excluded_keys).is_err() {
            settings.excluded_keys = default_excluded_keys();
        }
        Ok(settings)
    }

    /// Saves settings into `config_dir` using atomic write pattern
    pub fn save_to(&self, config_dir: &Path) -> io::Result<()> {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            // Set directory permissions to user-only on Unix
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = fs::Permissions::from_mode(0o700);
                let _ = fs::set_permissions(config_dir, perms);
            }
        }

        let config_path = config_dir.join("settings.json");
        let temp_path = config_dir.join("settings.json.tmp");
        let content = serde_json::to_string_pretty(self)?;

        // Atomic write: write to temp file first, then rename
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &config_path)?;

        Ok(())
    }

    // ── settings form ──

    /// Replace the excluded keys. Invalid input leaves the old value.
    pub fn set_excluded_keys(&mut self, value: &str) -> Result<()> {
        validate_excluded_keys(value)?;
        self.excluded_keys = value.to_string();
        Ok(())
    }

    /// Turning duplicate prevention off also turns the visual aid off.
    pub fn set_prevent_duplicate_opens(&mut self, on: bool) {
        self.prevent_duplicate_opens = on;
        if !on {
            self.background_open_visual_aid = false;
        }
    }

    /// The visual aid only applies while duplicate prevention is on.
    /// Returns whether the value was accepted.
    pub fn set_background_open_visual_aid(&mut self, on: bool) -> bool {
        if !self.prevent_duplicate_opens {
            return false;
        }
        self.background_open_visual_aid = on;
        true
    }

    pub fn visual_aid_editable(&self) -> bool {
        self.prevent_duplicate_opens
    }
}
