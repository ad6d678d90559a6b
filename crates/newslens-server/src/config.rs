//! Configuration file parsing for the analysis server.
//!
//! Loads settings from TOML: bind address, upload limit, analyzer and
//! provider sections, and the optional storage and database sections.
//! A few environment variables override the file afterwards.

use newslens_analyzer::AnalyzerConfig;
use newslens_llm::OpenAiConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Environment variable holding the provider API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the model identifier
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Environment variable overriding the maximum article length
pub const ENV_MAX_TEXT_LENGTH: &str = "MAX_TEXT_LENGTH";

/// Default request body limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (default: 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Request body limit in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Analysis settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Completion provider settings
    #[serde(default)]
    pub llm: OpenAiConfig,

    /// Object storage for uploads; disabled when absent
    #[serde(default)]
    pub storage: Option<StorageConfig>,

    /// Record persistence; disabled when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploads are written under
    pub root_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl ServerConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&contents)?;

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration for testing
    ///
    /// Binds to localhost, keeps storage and persistence off, and still
    /// honors the environment overrides.
    pub fn default_test_config() -> Self {
        Self::test_config_with(|name| std::env::var(name).ok())
    }

    /// Default test configuration with overrides resolved by `lookup`
    ///
    /// A malformed override is logged and skipped.
    fn test_config_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: default_bind_port(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            analyzer: AnalyzerConfig::default(),
            llm: OpenAiConfig::default(),
            storage: None,
            database: None,
        };
        if let Err(e) = config.apply_overrides(lookup) {
            warn!("Ignoring environment override: {}", e);
        }
        config
    }

    /// Apply `OPENAI_API_KEY`, `OPENAI_MODEL` and `MAX_TEXT_LENGTH`
    ///
    /// `lookup` resolves a variable name; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.llm.api_key = Some(api_key.trim().to_string());
        }

        if let Some(model) = lookup(ENV_MODEL) {
            self.analyzer.model = model.trim().to_string();
        }

        if let Some(max_text_length) = lookup(ENV_MAX_TEXT_LENGTH) {
            self.analyzer.max_text_length = max_text_length.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_MAX_TEXT_LENGTH, max_text_length
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        self.analyzer
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[analyzer] {}", e)))?;
        self.llm
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[llm] {}", e)))?;

        if let Some(storage) = &self.storage {
            if storage.root_dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "[storage] root_dir must not be empty".to_string(),
                ));
            }
        }
        if let Some(database) = &self.database {
            if database.path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("[database] path must not be empty".to_string()));
            }
        }

        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
