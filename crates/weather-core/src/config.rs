use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

/// Countries offered by the settings form, as `(code, label)`.
pub const COUNTRY_OPTIONS: [(&str, &str); 4] = [
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("GB", "Great Britain"),
    ("DE", "Germany"),
];

/// One problem found by `Config::validate`, tied to a dotted field path.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined with `; `
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Temperature scale shown by a weather block.
///
/// Serialized as the single-letter codes `"C"` and `"F"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TemperatureScale {
    #[serde(rename = "C")]
    Celsius,
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureScale {
    pub const ALL: [TemperatureScale; 2] = [TemperatureScale::Celsius, TemperatureScale::Fahrenheit];

    /// Single-letter code used in forms and config files.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Celsius => "Celsius",
            Self::Fahrenheit => "Fahrenheit",
        }
    }
}

impl fmt::Display for TemperatureScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TemperatureScale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "c" | "celsius" | "Celsius" => Ok(Self::Celsius),
            "F" | "f" | "fahrenheit" | "Fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(ConfigError::Invalid(format!(
                "Unknown temperature scale: {other:?} (expected C or F)"
            ))),
        }
    }
}

/// Per-block settings: which city to show and in which scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockConfiguration {
    /// Provider city id, as typed into the block form
    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub scale: TemperatureScale,
}

impl BlockConfiguration {
    pub fn new(city: impl Into<String>, scale: TemperatureScale) -> Self {
        Self {
            city: city.into(),
            scale,
        }
    }

    /// Both form fields are required.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.city.trim().is_empty() {
            return Err(ConfigError::MissingSetting("city".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider key and city import country
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Static city catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Time formatting for sunrise/sunset
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Configured weather blocks, keyed by block id
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Provider API key. Ex: f47c5dc1ae564c92faf2816b5e3b4c2d
    #[serde(default)]
    pub key: String,

    /// Two-letter country code the city import is restricted to
    #[serde(default = "default_country")]
    pub country: String,

    /// Current-conditions endpoint of the provider
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL of the provider's condition icons
    #[serde(default = "default_icon_url")]
    pub icon_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_country() -> String {
    "UA".to_string()
}

fn default_api_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_icon_url() -> String {
    "http://openweathermap.org/img/w".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            country: default_country(),
            api_url: default_api_url(),
            icon_url: default_icon_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// URL of the bulk city list (JSON array of `{id, name, country}`)
    #[serde(default = "default_catalog_url")]
    pub url: String,

    /// Directory served under `/res` so the catalog can be fetched locally
    #[serde(default = "default_resource_dir")]
    pub resource_dir: String,
}

fn default_catalog_url() -> String {
    "http://127.0.0.1:8090/res/city.list.json".to_string()
}

fn default_resource_dir() -> String {
    "res".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            resource_dir: default_resource_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the `weather_city` table
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weather-block")
        .join("weather.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Offset from UTC applied to sunrise/sunset, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            catalog: CatalogConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
            blocks: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, layered with `WEATHER_*` environment overrides.
    ///
    /// Nested keys use a double underscore: `WEATHER_WEATHER__KEY`, `WEATHER_SERVER__PORT`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Creating default configuration at {}", path.display());
            Self::default().save_to(path)?;
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::from(path.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("WEATHER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = settings
            .try_deserialize()
            .context("Failed to parse config file")?;

        // The `config` crate lowercases keys; block ids are case-sensitive.
        config.blocks = Self::read_blocks(path)?;

        Ok(config)
    }

    /// The `[blocks.<id>]` tables of the file at `path`, ids as written.
    fn read_blocks(path: &Path) -> Result<BTreeMap<String, BlockConfiguration>> {
        #[derive(Deserialize)]
        struct BlocksFile {
            #[serde(default)]
            blocks: BTreeMap<String, BlockConfiguration>,
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let file: BlocksFile = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(file.blocks)
    }

    /// Validate, logging warnings; fails if there are errors.
    pub fn ensure_valid(&self) -> Result<ValidationResult> {
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

        Ok(validation)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.weather.key.trim().is_empty() {
            result.add_warning(
                "weather.key",
                "Provider API key not set - weather blocks will render empty",
            );
        }

        if !is_known_country(&self.weather.country) {
            result.add_error(
                "weather.country",
                format!("Unsupported country code: {}", self.weather.country),
            );
        }

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);
        self.validate_url(&self.weather.icon_url, "weather.icon_url", &mut result);
        self.validate_url(&self.catalog.url, "catalog.url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        } else if self.weather.timeout_secs > 300 {
            result.add_warning("weather.timeout_secs", "Timeout is more than 5 minutes");
        }

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        if self.display.utc_offset_minutes.unsigned_abs() > 14 * 60 {
            result.add_error(
                "display.utc_offset_minutes",
                "UTC offset must be within +/-14 hours",
            );
        }

        for (id, block) in &self.blocks {
            if block.city.trim().is_empty() {
                result.add_warning(
                    format!("blocks.{id}.city"),
                    "No city configured - block will render empty",
                );
            }
        }

        result
    }

    /// Validate a URL field
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

    /// Block settings for `id`, or the defaults (`city = ""`, `scale = F`).
    pub fn block(&self, id: &str) -> BlockConfiguration {
        self.blocks.get(id).cloned().unwrap_or_default()
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weather-block");

        Ok(config_dir.join("config.toml"))
    }
}

/// Whether `code` is one of the settings form's country options.
pub fn is_known_country(code: &str) -> bool {
    COUNTRY_OPTIONS.iter().any(|(c, _)| *c == code)
}
