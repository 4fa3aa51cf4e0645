//! Configuration management for the farm stock client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FARMSTOCK_ prefix

use chrono::FixedOffset;
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Command backend connection
    pub api: ApiConfig,

    /// Audit timeline defaults
    pub audit: AuditConfig,

    /// Display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the command backend, without trailing slash
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    /// Number of log entries fetched per reload
    pub limit: u32,

    /// Hide sales postings and cancellations by default
    pub hide_automatic: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DisplayConfig {
    /// Viewer's UTC offset in minutes; the system zone when absent
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,

    /// `EnvFilter` directive overriding the default
    pub filter: Option<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FARMSTOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("api.base_url", "http://127.0.0.1:3000")?
            .set_default("api.timeout_secs", 30)?
            .set_default("audit.limit", 100)?
            .set_default("audit.hide_automatic", true)?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FARMSTOCK prefix)
            .add_source(
                Environment::with_prefix("FARMSTOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl DisplayConfig {
    /// Fixed viewer offset, if one is configured and valid
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.checked_mul(60)?))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            hide_automatic: true,
        }
    }
}
