//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/numeralbank/numeralbank.toml`
//! 3. Local config: `<dir>/.numeralbank.toml`
//! 4. Environment variables: `NUMERALBANK_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Colours and labels used for tree node markers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Marker colour when a value set has no colour of its own
    pub default_color: String,
    /// Marker colour for labels without data for the parameter
    pub missing_color: String,
    /// Word used in "Related ..." tooltip titles
    pub languages_label: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_color: "#ff6600".into(),
            missing_color: "#fff".into(),
            languages_label: "Languages".into(),
        }
    }
}

/// Raw display config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub default_color: Option<String>,
    pub missing_color: Option<String>,
    pub languages_label: Option<String>,
}

impl DisplayConfig {
    /// Scalar merge: overlay wins where specified.
    pub fn merge(&self, overlay: &RawDisplayConfig) -> Self {
        Self {
            default_color: overlay
                .default_color
                .clone()
                .unwrap_or_else(|| self.default_color.clone()),
            missing_color: overlay
                .missing_color
                .clone()
                .unwrap_or_else(|| self.missing_color.clone()),
            languages_label: overlay
                .languages_label
                .clone()
                .unwrap_or_else(|| self.languages_label.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub display: RawDisplayConfig,
}

/// Unified configuration for numeralbank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding dataset snapshots (default: ~/.numeralbank)
    pub data_dir: PathBuf,
    /// Tree marker display settings
    pub display: DisplayConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            display: DisplayConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".numeralbank"))
        .unwrap_or_else(|| PathBuf::from("~/.numeralbank"))
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for numeralbank.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "numeralbank").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("numeralbank.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".numeralbank.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            display: self.display.merge(&overlay.display),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.numeralbank.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply NUMERALBANK_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // NUMERALBANK_DATA_DIR, NUMERALBANK_DISPLAY__MISSING_COLOR
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("NUMERALBANK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("display.default_color") {
            settings.display.default_color = val;
        }
        if let Ok(val) = config.get_string("display.missing_color") {
            settings.display.missing_color = val;
        }
        if let Ok(val) = config.get_string("display.languages_label") {
            settings.display.languages_label = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# numeralbank configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/numeralbank/numeralbank.toml
#   Local:  <dir>/.numeralbank.toml   (dir given with -C)
#   Env:    NUMERALBANK_* environment variables, e.g. NUMERALBANK_DISPLAY__DEFAULT_COLOR

# Directory holding dataset snapshots
# data_dir = "~/.numeralbank"

[display]
# Marker colour when a value set carries no colour
# default_color = "#ff6600"

# Marker colour for labels without data for the selected parameter
# missing_color = "#fff"

# Used in "Related <label>" tooltip titles
# languages_label = "Languages"
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert!(settings.data_dir.to_string_lossy().contains(".numeralbank"));
        assert_eq!(settings.display.missing_color, "#fff");
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/.numeralbank"),
            display: DisplayConfig::default(),
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.data_dir.to_string_lossy();
        assert!(dir.starts_with(&home), "data_dir should start with home dir: {}", dir);
        assert!(!dir.contains('~'), "data_dir should not contain tilde: {}", dir);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_only_specified_fields_change() {
        let base = DisplayConfig::default();
        let overlay = RawDisplayConfig {
            default_color: Some("#000".into()),
            ..Default::default()
        };

        let merged = base.merge(&overlay);

        assert_eq!(merged.default_color, "#000");
        assert_eq!(merged.missing_color, base.missing_color);
        assert_eq!(merged.languages_label, base.languages_label);
    }

    #[test]
    fn given_settings_when_serialized_then_round_trips_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_dir.is_none());
        assert!(raw.display.default_color.is_none());
    }
}
