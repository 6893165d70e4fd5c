use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

const APP_DIR: &str = "skyboard";
const CONFIG_FILE: &str = "config.toml";

/// Public Open-Meteo forecast endpoint
pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the config file was loaded from
    #[serde(skip)]
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Which cities the dashboard starts with and which extra cities it knows
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Log filter
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast endpoint queried for current conditions
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

/// A user-supplied city appended to the built-in catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_label: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// City ids shown at startup. Ids missing from the catalog are skipped.
    #[serde(default = "default_cities")]
    pub default_cities: Vec<String>,

    #[serde(default)]
    pub extra_cities: Vec<CityEntry>,
}

fn default_cities() -> Vec<String> {
    ["kyiv", "singapore", "london", "sydney"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_cities: default_cities(),
            extra_cities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` overrides it
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file there
    /// if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&contents).context("Failed to parse config file")?;
        if let Some(parent) = path.parent() {
            config.config_dir = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Check the configuration, logging warnings and failing on errors.
    pub fn validated(self) -> Result<(Self, ValidationResult)> {
        let validation = self.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);

        if self.dashboard.default_cities.is_empty() {
            result.add_warning("dashboard.default_cities", "Dashboard starts empty");
        }

        let mut seen = HashSet::new();
        for id in &self.dashboard.default_cities {
            if !seen.insert(id.as_str()) {
                result.add_warning(
                    "dashboard.default_cities",
                    format!("City listed more than once: {}", id),
                );
            }
        }

        for (i, city) in self.dashboard.extra_cities.iter().enumerate() {
            let field = format!("dashboard.extra_cities[{}]", i);
            if city.id.trim().is_empty() {
                result.add_error(&field, "City id must not be empty");
            }
            if !(-90.0..=90.0).contains(&city.latitude) {
                result.add_error(
                    &field,
                    format!("Latitude out of range: {}", city.latitude),
                );
            }
            if !(-180.0..=180.0).contains(&city.longitude) {
                result.add_error(
                    &field,
                    format!("Longitude out of range: {}", city.longitude),
                );
            }
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.filter).is_err() {
            result.add_warning(
                "logging.filter",
                format!("Unrecognized filter, falling back to info: {}", self.logging.filter),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);

        Ok(config_dir.join(CONFIG_FILE))
    }
}
