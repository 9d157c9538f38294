//! Configuration management for the weather journal
//!
//! Handles loading configuration from files and environment variables,
//! and validates every setting before the service starts.

use crate::JournalError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JournalConfig {
    /// WeatherAPI.com client settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Date range policy
    #[serde(default)]
    pub range: RangeConfig,
    /// Video search settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Record persistence
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// WeatherAPI.com key (required to start the server)
    pub api_key: Option<String>,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Which date ranges the journal accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Maximum number of calendar days in one search
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
    /// Forecast horizon of the provider, counting today
    #[serde(default = "default_max_forecast_days")]
    pub max_forecast_days: u32,
    /// First date the provider serves history for
    #[serde(default = "default_earliest_history")]
    pub earliest_history: NaiveDate,
}

/// Video search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// YouTube Data API key; video enrichment is disabled without one
    pub api_key: Option<String>,
    #[serde(default = "default_video_base_url")]
    pub base_url: String,
    /// Number of video ids attached to a search
    #[serde(default = "default_max_videos")]
    pub max_results: u32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Record persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `fjall` (on disk) or `memory`
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Database directory for the fjall backend
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.weatherapi.com/v1".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_range_days() -> u32 {
    14
}

fn default_max_forecast_days() -> u32 {
    14
}

fn default_earliest_history() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_video_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_max_videos() -> u32 {
    3
}

fn default_storage_backend() -> String {
    "fjall".to_string()
}

fn default_storage_path() -> String {
    "weather_journal_db".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
            max_forecast_days: default_max_forecast_days(),
            earliest_history: default_earliest_history(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_video_base_url(),
            max_results: default_max_videos(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl JournalConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHER_JOURNAL_WEATHER__API_KEY=... overrides weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_JOURNAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: JournalConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-journal").join("config.toml"))
    }

    /// Apply default values to empty or zeroed fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.range.max_range_days == 0 {
            self.range.max_range_days = default_max_range_days();
        }
        if self.range.max_forecast_days == 0 {
            self.range.max_forecast_days = default_max_forecast_days();
        }
        if self.video.base_url.is_empty() {
            self.video.base_url = default_video_base_url();
        }
        if self.video.timeout_seconds == 0 {
            self.video.timeout_seconds = default_timeout();
        }
        if self.storage.backend.is_empty() {
            self.storage.backend = default_storage_backend();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys when they are present
    pub fn validate_api_keys(&self) -> Result<()> {
        for (name, key) in [
            ("Weather", &self.weather.api_key),
            ("Video", &self.video.api_key),
        ] {
            if let Some(api_key) = key {
                if api_key.trim().is_empty() {
                    return Err(JournalError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if api_key.len() > 100 {
                    return Err(JournalError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 || self.video.timeout_seconds > 300 {
            return Err(JournalError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.range.max_forecast_days > 14 {
            return Err(JournalError::config(
                "Forecast horizon cannot exceed the provider's 14 days",
            )
            .into());
        }

        if self.range.max_range_days > 31 {
            return Err(JournalError::config("Search range cannot exceed 31 days").into());
        }

        if self.video.max_results > 50 {
            return Err(JournalError::config("Video max results cannot exceed 50").into());
        }

        if self.server.port == 0 {
            return Err(JournalError::config("Server port must be non-zero").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(JournalError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(JournalError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_backends = ["fjall", "memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(JournalError::config(format!(
                "Invalid storage backend '{}'. Must be one of: {}",
                self.storage.backend,
                valid_backends.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Video", &self.video.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(JournalError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.weather.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.range.max_forecast_days, 14);
        assert_eq!(
            config.range.earliest_history,
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()
        );
        assert_eq!(config.video.max_results, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_api_key() {
        let mut config = JournalConfig::default();
        config.weather.api_key = Some("  ".to_string());
        let result = config.validate_api_keys();
        assert!(result.unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = JournalConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = JournalConfig::default();
        config.range.max_forecast_days = 30;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Forecast horizon"));
    }

    #[test]
    fn test_config_validation_backend() {
        let mut config = JournalConfig::default();
        config.storage.backend = "postgres".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("storage backend"));
    }

    #[test]
    fn test_apply_defaults_fills_zeroed_fields() {
        let mut config = JournalConfig::default();
        config.weather.base_url.clear();
        config.range.max_range_days = 0;
        config.logging.format.clear();
        config.apply_defaults();
        assert_eq!(config.weather.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(config.range.max_range_days, 14);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "file-key-123"

[range]
max_range_days = 7
earliest_history = "2015-06-01"

[storage]
backend = "memory"
"#
        )
        .unwrap();

        let config = JournalConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.weather.api_key.as_deref(), Some("file-key-123"));
        assert_eq!(config.range.max_range_days, 7);
        assert_eq!(config.range.max_forecast_days, 14);
        assert_eq!(
            config.range.earliest_history,
            NaiveDate::from_ymd_opt(2015, 6, 1).unwrap()
        );
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = JournalConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weather-journal"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
