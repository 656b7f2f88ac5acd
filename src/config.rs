//! Configuration: application settings and the portable rules document.
//!
//! Two separate surfaces:
//! - `Settings` (TOML) carries machine-local concerns — the classifier
//!   endpoint and default folder exclusions — and loads through the usual
//!   cascade: explicit path, then `./sortify.toml`, then
//!   `~/.config/sortify/config.toml`, then built-in defaults.
//! - `RulesFile` (JSON) is the portable `{version, customRules,
//!   excludedFolders}` document users import and export. The engine only
//!   consumes its contents as plain data; storage stays out here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rules::CustomRule;

/// Errors loading or saving configuration files.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Invalid(String),
    Io(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {reason}"),
            ConfigError::Io(reason) => write!(f, "IO error reading configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_excluded_folders() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        "target".to_string(),
    ]
}

/// Classifier endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key; the key
    /// itself never lives in a config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Machine-local application settings (TOML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub classifier: ClassifierSettings,
    /// Folder names skipped during scans, in addition to whatever the
    /// rules document excludes.
    #[serde(default = "default_excluded_folders")]
    pub excluded_folders: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            classifier: ClassifierSettings::default(),
            excluded_folders: default_excluded_folders(),
        }
    }
}

impl Settings {
    /// Loads settings with the lookup cascade. Only an explicitly given
    /// path is required to exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from("sortify.toml");
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortify")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.classifier.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

pub const RULES_FORMAT_VERSION: u32 = 1;

/// The portable rules and exclusions document (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesFile {
    pub version: u32,
    #[serde(default)]
    pub custom_rules: Vec<CustomRule>,
    #[serde(default)]
    pub excluded_folders: Vec<String>,
}

impl Default for RulesFile {
    fn default() -> Self {
        Self {
            version: RULES_FORMAT_VERSION,
            custom_rules: Vec::new(),
            excluded_folders: Vec::new(),
        }
    }
}

impl RulesFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// The combined exclusion set for a scan.
    pub fn exclusion_set(&self, settings: &Settings, extra: &[String]) -> HashSet<String> {
        self.excluded_folders
            .iter()
            .chain(settings.excluded_folders.iter())
            .chain(extra.iter())
            .cloned()
            .collect()
    }
}
