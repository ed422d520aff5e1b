//! Key/value settings store, persisted as JSON.
//!
//! Keys are `section.name`. Every known key has a kind and a default, and
//! `set` refuses values that do not parse as the key's kind. The file holds
//! one JSON object per section with string values:
//!
//! ```json
//! { "display": { "refresh_ms": "1500" }, "actions": { "confirm_kill": "true" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::SettingsError;
use crate::types::{DisplayOptions, SortColumn};

// ============================================================================
// KNOWN KEYS
// ============================================================================

pub const REFRESH_MS: &str = "display.refresh_ms";
pub const SHOW_KERNEL_THREADS: &str = "display.show_kernel_threads";
pub const SORT_COLUMN: &str = "display.sort_column";
pub const SORT_DESCENDING: &str = "display.sort_descending";
pub const CONFIRM_KILL: &str = "actions.confirm_kill";

/// Shortest refresh interval accepted.
pub const MIN_REFRESH_MS: u64 = 250;

/// Value type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    /// Milliseconds, at least [`MIN_REFRESH_MS`].
    Millis,
    Sort,
}

impl SettingKind {
    fn name(self) -> &'static str {
        match self {
            SettingKind::Bool => "boolean",
            SettingKind::Millis => "interval in milliseconds",
            SettingKind::Sort => "sort column",
        }
    }

    /// Canonical spelling of `value`, or None if it does not parse.
    fn normalise(self, value: &str) -> Option<String> {
        let value = value.trim();
        match self {
            SettingKind::Bool => match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some("true".to_string()),
                "false" | "no" | "off" | "0" => Some("false".to_string()),
                _ => None,
            },
            SettingKind::Millis => value
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms >= MIN_REFRESH_MS)
                .map(|ms| ms.to_string()),
            SettingKind::Sort => SortColumn::parse(value).map(|c| c.as_str().to_string()),
        }
    }
}

/// (key, kind, default, description)
pub const KNOWN_SETTINGS: [(&str, SettingKind, &str, &str); 5] = [
    (REFRESH_MS, SettingKind::Millis, "1500", "Refresh interval (ms)"),
    (SHOW_KERNEL_THREADS, SettingKind::Bool, "false", "Show kernel threads"),
    (SORT_COLUMN, SettingKind::Sort, "cpu", "Sort column"),
    (SORT_DESCENDING, SettingKind::Bool, "true", "Sort descending"),
    (CONFIRM_KILL, SettingKind::Bool, "true", "Confirm before kill"),
];

pub fn kind_of(key: &str) -> Option<SettingKind> {
    KNOWN_SETTINGS
        .iter()
        .find(|(k, ..)| *k == key)
        .map(|(_, kind, ..)| *kind)
}

pub fn description_of(key: &str) -> &'static str {
    KNOWN_SETTINGS
        .iter()
        .find(|(k, ..)| *k == key)
        .map_or("", |(.., d)| *d)
}

/// Returns the default settings file path.
///
/// On Linux: ~/.config/taskcon/settings.json
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskcon")
        .join("settings.json")
}

// ============================================================================
// STORE
// ============================================================================

type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    sections: Sections,
    dirty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let mut sections = Sections::new();
        for (key, _, default, _) in KNOWN_SETTINGS {
            if let Some((section, name)) = key.split_once('.') {
                sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(name.to_string(), default.to_string());
            }
        }
        Settings {
            sections,
            dirty: false,
        }
    }
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&str> {
        let (section, name) = key.split_once('.')?;
        self.sections.get(section)?.get(name).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.parse().ok()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key)?.parse().ok()
    }

    /// Set a known key, normalising the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let kind = kind_of(key).ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;
        let normalised = kind.normalise(value).ok_or_else(|| SettingsError::InvalidValue {
            key: key.to_string(),
            expected: kind.name(),
            value: value.to_string(),
        })?;
        let Some((section, name)) = key.split_once('.') else {
            return Err(SettingsError::UnknownKey(key.to_string()));
        };

        let slot = self
            .sections
            .entry(section.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default();
        if *slot != normalised {
            debug!(key, value = %normalised, "setting changed");
            *slot = normalised;
            self.dirty = true;
        }
        Ok(())
    }

    /// Flip a boolean setting and return the new value.
    pub fn toggle(&mut self, key: &str) -> Result<bool, SettingsError> {
        let current = self.get_bool(key).unwrap_or(false);
        self.set(key, if current { "false" } else { "true" })?;
        Ok(!current)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.sections.iter().map(|(s, entries)| (s.as_str(), entries))
    }

    /// Changed since load or the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn display_options(&self) -> DisplayOptions {
        let defaults = DisplayOptions::default();
        DisplayOptions {
            refresh: self
                .get_u64(REFRESH_MS)
                .map_or(defaults.refresh, Duration::from_millis),
            show_kernel_threads: self
                .get_bool(SHOW_KERNEL_THREADS)
                .unwrap_or(defaults.show_kernel_threads),
            sort_column: self
                .get(SORT_COLUMN)
                .and_then(SortColumn::parse)
                .unwrap_or(defaults.sort_column),
            sort_descending: self
                .get_bool(SORT_DESCENDING)
                .unwrap_or(defaults.sort_descending),
        }
    }

    /// Load from `path`, layered over the defaults.
    ///
    /// A missing file yields the defaults. Unknown keys and invalid values in
    /// the file are skipped with a warning.
    pub fn load(path: &Path) -> Result<Settings, SettingsError> {
        let mut settings = Settings::default();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(settings);
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let stored: Sections =
            serde_json::from_str(&contents).map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        for (section, entries) in stored {
            for (name, value) in entries {
                let key = format!("{section}.{name}");
                if let Err(err) = settings.set(&key, &value) {
                    warn!(path = %path.display(), error = %err, "ignoring stored setting");
                }
            }
        }
        settings.dirty = false;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Write to `path` as pretty JSON, creating the parent directory.
    pub fn save(&mut self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents =
            serde_json::to_string_pretty(&self.sections).map_err(|source| SettingsError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(path, contents).map_err(io_err)?;
        self.dirty = false;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Settings a run starts with and where they may be written back.
#[derive(Debug)]
pub struct SessionSettings {
    pub settings: Settings,
    /// None when the file on disk must not be overwritten.
    pub save_path: Option<PathBuf>,
    pub load_error: Option<SettingsError>,
}

/// Load `path` for a run.
///
/// A file that exists but cannot be read or parsed is left untouched: the
/// run uses defaults and saving is disabled for it.
pub fn load_session(path: &Path) -> SessionSettings {
    match Settings::load(path) {
        Ok(settings) => SessionSettings {
            settings,
            save_path: Some(path.to_path_buf()),
            load_error: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "using default settings, saving disabled");
            SessionSettings {
                settings: Settings::default(),
                save_path: None,
                load_error: Some(err),
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
