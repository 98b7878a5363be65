//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::StorageConfig as StoreConfig;
use crate::views::TimelineSettings;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub clinic: ClinicConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// File path or http(s) URL with `{ appointments, payments }`
    #[serde(default)]
    pub seed_source: Option<String>,

    #[serde(default = "default_seed_timeout")]
    pub seed_timeout_ms: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("dentacal").to_string_lossy().to_string())
        .unwrap_or_else(|| "./dentacal_data".to_string())
}

fn default_seed_timeout() -> u64 {
    5000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed_source: None,
            seed_timeout_ms: default_seed_timeout(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Clinic hours and booking defaults
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicConfig {
    #[serde(default = "default_clinic_name")]
    pub name: String,

    #[serde(default = "default_opening_hour")]
    pub opening_hour: u32,

    #[serde(default = "default_closing_hour")]
    pub closing_hour: u32,

    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    #[serde(default = "default_duration")]
    pub default_duration_minutes: u32,

    #[serde(default = "default_rooms")]
    pub rooms: Vec<String>,
}

fn default_clinic_name() -> String {
    "Dental Clinic".to_string()
}

fn default_opening_hour() -> u32 {
    8
}

fn default_closing_hour() -> u32 {
    18
}

fn default_slot_minutes() -> u32 {
    30
}

fn default_duration() -> u32 {
    30
}

fn default_rooms() -> Vec<String> {
    vec!["101".to_string(), "102".to_string(), "103".to_string()]
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            name: default_clinic_name(),
            opening_hour: default_opening_hour(),
            closing_hour: default_closing_hour(),
            slot_minutes: default_slot_minutes(),
            default_duration_minutes: default_duration(),
            rooms: default_rooms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("dentacal").join("config.toml")),
            Some(PathBuf::from("/etc/dentacal/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `DENTACAL_*` overrides from any lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(data_dir) = lookup("DENTACAL_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Some(seed) = lookup("DENTACAL_SEED_SOURCE") {
            self.storage.seed_source = (!seed.trim().is_empty()).then_some(seed);
        }

        if let Some(host) = lookup("DENTACAL_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("DENTACAL_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid DENTACAL_API_PORT"),
            }
        }

        if let Some(level) = lookup("DENTACAL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("DENTACAL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let clinic = &self.clinic;
        if clinic.opening_hour >= clinic.closing_hour || clinic.closing_hour > 24 {
            return Err(ConfigError::Invalid(format!(
                "clinic hours {}..{} must satisfy opening < closing <= 24",
                clinic.opening_hour, clinic.closing_hour
            )));
        }
        if clinic.slot_minutes == 0 || 60 % clinic.slot_minutes != 0 {
            return Err(ConfigError::Invalid(format!(
                "slot_minutes must divide an hour, got {}",
                clinic.slot_minutes
            )));
        }
        if clinic.default_duration_minutes == 0 {
            return Err(ConfigError::Invalid(
                "default_duration_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the clinic store
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: PathBuf::from(&self.storage.data_dir),
            seed_source: self.storage.seed_source.clone(),
            default_duration_minutes: self.clinic.default_duration_minutes as i64,
            seed_timeout_ms: self.storage.seed_timeout_ms,
        }
    }

    /// Settings for the timeline grid and quick-book
    pub fn timeline_settings(&self) -> TimelineSettings {
        TimelineSettings {
            opening_hour: self.clinic.opening_hour,
            closing_hour: self.clinic.closing_hour,
            slot_minutes: self.clinic.slot_minutes,
            default_duration_minutes: self.clinic.default_duration_minutes,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Dentacal Configuration
#
# Environment variables override these settings:
# - DENTACAL_DATA_DIR
# - DENTACAL_SEED_SOURCE
# - DENTACAL_API_HOST
# - DENTACAL_API_PORT
# - DENTACAL_LOG_LEVEL
# - DENTACAL_LOG_FORMAT

[storage]
# Directory holding one JSON file per storage key
data_dir = "~/.local/share/dentacal"

# Optional startup data: a file path or an http(s) URL
# seed_source = "./data.json"

# Timeout for fetching a seed URL (ms)
seed_timeout_ms = 5000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty allows any origin)
cors_origins = []

[clinic]
name = "Dental Clinic"

# Timeline rows run from opening to closing hour
opening_hour = 8
closing_hour = 18

# Timeline slot size, must divide an hour
slot_minutes = 30

# Length of quick-booked appointments and of stored ones without an end
default_duration_minutes = 30

rooms = ["101", "102", "103"]

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.clinic.slot_minutes, 30);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.storage.seed_source.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[clinic]\nopening_hour = 7\n").unwrap();
        assert_eq!(config.clinic.opening_hour, 7);
        assert_eq!(config.clinic.closing_hour, 18);
        assert_eq!(config.api.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_hours_rejected() {
        let err = Config::parse("[clinic]\nopening_hour = 18\nclosing_hour = 8\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Config::parse("[clinic]\nslot_minutes = 25\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DENTACAL_DATA_DIR", "/tmp/clinic"),
            ("DENTACAL_API_PORT", "9000"),
            ("DENTACAL_SEED_SOURCE", "https://example.com/seed.json"),
            ("DENTACAL_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, "/tmp/clinic");
        assert_eq!(config.api.port, 9000);
        assert_eq!(
            config.storage.seed_source.as_deref(),
            Some("https://example.com/seed.json")
        );
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_port_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "DENTACAL_API_PORT").then(|| "http".to_string()));
        assert_eq!(config.api.port, 8090);
    }

    #[test]
    fn test_conversions() {
        let config = Config::parse(
            "[storage]\ndata_dir = \"/srv/dentacal\"\n[clinic]\ndefault_duration_minutes = 45\n",
        )
        .unwrap();

        let store = config.store_config();
        assert_eq!(store.data_dir, PathBuf::from("/srv/dentacal"));
        assert_eq!(store.default_duration_minutes, 45);

        let timeline = config.timeline_settings();
        assert_eq!(timeline.default_duration_minutes, 45);
        assert_eq!(timeline.slot_count(), 20);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nport = 8123\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 8123);

        let missing = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
