//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and the page/limit clamping rules.

use crate::models::PageRequest;
use clap::Parser;
use std::path::PathBuf;

/// Dexfeed - paginated summaries over a catalog API
///
/// Fetches one page of the upstream collection, resolves every entry's
/// detail record concurrently and prints a normalized summary per entry.
///
/// Examples:
///   dexfeed
///   dexfeed --page 3 --limit 50
///   dexfeed --page 2 --format markdown --output page2.md
///   dexfeed --api-url http://localhost:8000/api/v2 --collection pokemon
///   dexfeed --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Page to fetch (1-indexed)
    ///
    /// Values below 1 are treated as 1.
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Entries per page
    ///
    /// Clamped to 1..=50. Defaults to the config value (20).
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Base URL of the catalog API
    #[arg(long, value_name = "URL", env = "DEXFEED_API_URL")]
    pub api_url: Option<String>,

    /// Collection path under the base URL
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Maximum concurrent detail requests
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for the whole page in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Output format (json, markdown)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dexfeed.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .dexfeed.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of summaries (default)
    #[default]
    Json,
    /// Markdown cards
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The page to aggregate, with defaults and clamping applied.
    pub fn page_request(&self, default_limit: u32) -> PageRequest {
        PageRequest::clamped(self.page, self.limit, default_limit)
    }
}
