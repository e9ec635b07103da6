//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.dexfeed.toml` files.

use crate::aggregator::AggregatorOptions;
use crate::models::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::upstream::CatalogConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".dexfeed.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Upstream catalog settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Upstream catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the catalog API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Collection path under the base URL.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection: default_collection(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://pokeapi.co/api/v2".to_string()
}

fn default_collection() -> String {
    "pokemon".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("dexfeed/{}", env!("CARGO_PKG_VERSION"))
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum concurrent detail requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for a whole page in seconds. 0 disables it.
    #[serde(default = "default_deadline")]
    pub deadline_seconds: u64,

    /// Page size used when `--limit` is not given.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            deadline_seconds: default_deadline(),
            default_limit: default_limit(),
        }
    }
}

fn default_concurrency() -> usize {
    16
}

fn default_deadline() -> u64 {
    60
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl From<&UpstreamConfig> for CatalogConfig {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            collection: config.collection.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl From<&FetchConfig> for AggregatorOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            deadline: (config.deadline_seconds > 0)
                .then(|| Duration::from_secs(config.deadline_seconds)),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.fetch.default_limit = config.fetch.default_limit.clamp(1, MAX_LIMIT);
        // A zero reqwest timeout fails every request immediately.
        config.upstream.timeout_seconds = config.upstream.timeout_seconds.max(1);
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.dexfeed.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.upstream.base_url = api_url.clone();
        }
        if let Some(ref collection) = args.collection {
            self.upstream.collection = collection.clone();
        }
        if let Some(timeout) = args.timeout {
            self.upstream.timeout_seconds = timeout;
        }

        if let Some(concurrency) = args.concurrency {
            self.fetch.concurrency = concurrency;
        }
        if let Some(deadline) = args.deadline {
            self.fetch.deadline_seconds = deadline;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
