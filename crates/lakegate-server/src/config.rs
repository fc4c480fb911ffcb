//! Server configuration loading from file and environment variables.

use lakegate_db::LakeSettings;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Lake file layout.
    #[serde(default)]
    pub lake: LakeConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Paths of the local database, the catalog, and the lake data root.
#[derive(Debug, Clone, Deserialize)]
pub struct LakeConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "lakegate_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/app/lake_duckdb/ducklake.db")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("/app/lake_duckdb/catalog.duckdb")
}

fn default_data_path() -> PathBuf {
    PathBuf::from("/app/lake_duckdb/data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LakeConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            catalog_path: default_catalog_path(),
            data_path: default_data_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LakeConfig {
    /// Connection settings for these paths, with the default catalog extension
    /// and fallback seed.
    pub fn settings(&self) -> LakeSettings {
        LakeSettings::new(&self.db_path, &self.catalog_path, &self.data_path)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `DB_PATH`, `CATALOG_PATH`, `DATA_PATH` override the `lake` paths
/// - `LAKEGATE_HOST` overrides `server.host`
/// - `LAKEGATE_PORT` overrides `server.port`
/// - `LAKEGATE_LOG_LEVEL` overrides `logging.level`
/// - `LAKEGATE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], reading overrides through `var` instead of the
/// process environment.
pub fn load_config_with<F>(path: Option<&str>, var: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(db_path) = var("DB_PATH") {
        config.lake.db_path = db_path.into();
    }
    if let Some(catalog_path) = var("CATALOG_PATH") {
        config.lake.catalog_path = catalog_path.into();
    }
    if let Some(data_path) = var("DATA_PATH") {
        config.lake.data_path = data_path.into();
    }
    if let Some(host) = var("LAKEGATE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("LAKEGATE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("LAKEGATE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("LAKEGATE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
