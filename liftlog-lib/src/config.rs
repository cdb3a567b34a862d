//src/config.rs
use crate::chart::ChartMetric;
use comfy_table::Color;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "liftlog";
const CONFIG_ENV_VAR: &str = "LIFTLOG_CONFIG_DIR"; // Environment variable name
pub const NUTRITIONIX_APP_ID_ENV_VAR: &str = "NUTRITIONIX_APP_ID";
pub const NUTRITIONIX_API_KEY_ENV_VAR: &str = "NUTRITIONIX_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("Invalid URL '{0}': must be an absolute http(s) URL.")]
    InvalidUrl(String),
    #[error("Request timeout must be greater than zero seconds.")]
    InvalidTimeout,
}

/// Only decides the unit label next to weights. Values are stored as typed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric, // kg
    #[default]
    Imperial, // lbs
}

impl Units {
    pub const fn weight_label(self) -> &'static str {
        match self {
            Self::Metric => "kg",
            Self::Imperial => "lbs",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "metric"),
            Self::Imperial => write!(f, "imperial"),
        }
    }
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

/// Case-insensitive colour name lookup.
///
/// # Errors
/// `ConfigError::InvalidColor` for an unknown name.
pub fn parse_color(color_str: &str) -> Result<StandardColor, ConfigError> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str.trim()))
        .ok_or_else(|| ConfigError::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NutritionConfig {
    pub base_url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub remote_user_id: String,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trackapi.nutritionix.com/v2".to_string(),
            app_id: None,
            app_key: None,
            remote_user_id: "0".to_string(),
        }
    }
}

impl NutritionConfig {
    /// Credentials with `NUTRITIONIX_APP_ID` / `NUTRITIONIX_API_KEY` taking
    /// precedence over the file. `None` unless both halves are present.
    pub fn resolved_credentials(&self) -> Option<(String, String)> {
        let from_env = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        let app_id = from_env(NUTRITIONIX_APP_ID_ENV_VAR).or_else(|| self.app_id.clone())?;
        let app_key = from_env(NUTRITIONIX_API_KEY_ENV_VAR).or_else(|| self.app_key.clone())?;
        Some((app_id, app_key))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    pub store_url: String,
    pub request_timeout_secs: u64,
    pub notice_seconds: u64,
    pub units: Units,
    pub chart_metric: ChartMetric,

    // Theming
    pub theme: Theme,

    pub nutrition: NutritionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 10,
            notice_seconds: 5,
            units: Units::default(),
            chart_metric: ChartMetric::default(),
            theme: Theme::default(),
            nutrition: NutritionConfig::default(),
        }
    }
}

impl Config {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_seconds)
    }

    /// Checks the values a hand-edited file could get wrong.
    ///
    /// # Errors
    /// `InvalidUrl`, `InvalidTimeout` or `InvalidColor`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.store_url)?;
        validate_url(&self.nutrition.base_url)?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        parse_color(&self.theme.header_color)?;
        Ok(())
    }
}

/// # Errors
/// `ConfigError::InvalidUrl` unless `url` is an absolute http or https URL.
pub fn validate_url(url: &str) -> Result<(), ConfigError> {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(url.to_string())),
    }
}

/// Determines the path to the configuration file, creating its directory.
///
/// # Errors
/// `CannotDetermineConfigDir` without a home config dir, `Io` if it cannot be created.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir_path = match std::env::var(CONFIG_ENV_VAR) {
        Ok(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.is_dir() {
                warn!(
                    "{} points to '{}', which is not a directory. Trying to create it.",
                    CONFIG_ENV_VAR,
                    path.display()
                );
            }
            path
        }
        Err(_) => dirs::config_dir()
            .ok_or(ConfigError::CannotDetermineConfigDir)?
            .join(APP_CONFIG_DIR),
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration, writing a default file if none exists yet.
///
/// # Errors
/// `Io`, `TomlParse` or `TomlSerialize`.
pub fn load_config(config_path: &Path) -> Result<Config, ConfigError> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    } else {
        info!("No config at {}; writing defaults", config_path.display());
        let default_config = Config::default();
        save_config(config_path, &default_config)?;
        Ok(default_config)
    }
}

/// # Errors
/// `Io` or `TomlSerialize`.
pub fn save_config(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str("store_url = \"http://gym.local:8080\"\n").unwrap();
        assert_eq!(config.store_url, "http://gym.local:8080");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.nutrition.remote_user_id, "0");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.store_url = "localhost:3000/".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        config.store_url = "http://localhost:3000".to_string();
        config.request_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn parse_color_ignores_case() {
        assert_eq!(parse_color("darkcyan").unwrap(), StandardColor::DarkCyan);
        assert!(parse_color("mauve").is_err());
    }
}
