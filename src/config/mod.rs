//! Configuration loading and validation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::GeneratorConfig;
use crate::fetch::FetchConfig;
use crate::models::Region;
use crate::storage::StorageConfig;
use crate::sync::RefreshConfig;

/// Environment variable that overrides the configured upstream key.
const API_KEY_ENV: &str = "RIOT_API_KEY";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
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
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream ranked API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API key sent on every request. Usually left empty here and
    /// supplied through `RIOT_API_KEY` instead.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Fallback delay when a 429 carries no usable Retry-After header.
    #[serde(default = "default_retry_after")]
    pub retry_after_default_secs: u64,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_retry_after() -> u64 {
    1
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
            retry_after_default_secs: default_retry_after(),
        }
    }
}

impl UpstreamConfig {
    /// The environment wins over the file, so deployments can keep the
    /// secret out of config.toml.
    pub fn resolved_api_key(&self) -> String {
        std::env::var(API_KEY_ENV).unwrap_or_else(|_| self.api_key.clone())
    }
}

/// Ladder refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSection {
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Concurrent account lookups per region pass.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_max_pages")]
    pub max_pages_per_division: u32,

    /// Hard ceiling on players collected per region pass.
    #[serde(default = "default_ladder_cap")]
    pub ladder_cap: usize,

    #[serde(default = "default_max_item_attempts")]
    pub max_item_attempts: u32,
}

fn default_regions() -> Vec<Region> {
    vec![Region::Euw]
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_fan_out() -> usize {
    5
}

fn default_page_size() -> usize {
    205
}

fn default_max_pages() -> u32 {
    10
}

fn default_ladder_cap() -> usize {
    10_000
}

fn default_max_item_attempts() -> u32 {
    3
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            interval_secs: default_interval_secs(),
            fan_out: default_fan_out(),
            page_size: default_page_size(),
            max_pages_per_division: default_max_pages(),
            ladder_cap: default_ladder_cap(),
            max_item_attempts: default_max_item_attempts(),
        }
    }
}

/// Match analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Cache version tag; bump it to invalidate every cached analysis.
    #[serde(default = "default_analysis_version")]
    pub version: String,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

fn default_analysis_version() -> String {
    "v1".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            version: default_analysis_version(),
            generator: GeneratorConfig::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            refresh: RefreshSection::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.upstream.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream request timeout must be greater than 0".to_string(),
            ));
        }

        if self.refresh.regions.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one refresh region must be configured".to_string(),
            ));
        }

        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Refresh interval must be greater than 0".to_string(),
            ));
        }

        if self.refresh.fan_out == 0 {
            return Err(ConfigError::ValidationError(
                "Refresh fan_out must be greater than 0".to_string(),
            ));
        }

        if self.refresh.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "Refresh page_size must be greater than 0".to_string(),
            ));
        }

        if self.refresh.max_item_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "Refresh max_item_attempts must be greater than 0".to_string(),
            ));
        }

        if self.analysis.version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Analysis version must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Client settings for the upstream fetcher.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            api_key: self.upstream.resolved_api_key(),
            timeout: Duration::from_secs(self.upstream.request_timeout_secs),
            retry_after_default_secs: self.upstream.retry_after_default_secs,
            ..FetchConfig::default()
        }
    }

    /// Orchestrator settings derived from the refresh section.
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            regions: self.refresh.regions.clone(),
            interval: Duration::from_secs(self.refresh.interval_secs),
            fan_out: self.refresh.fan_out,
            page_size: self.refresh.page_size,
            max_pages_per_division: self.refresh.max_pages_per_division,
            ladder_cap: self.refresh.ladder_cap,
            max_item_attempts: self.refresh.max_item_attempts,
        }
    }

    /// Storage paths rooted at the configured data directory.
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }
}
