//! Dexfeed - paginated summaries over a catalog API
//!
//! A CLI tool that fetches one page of an upstream collection, resolves
//! every entry's detail record concurrently, and prints a normalized
//! summary per entry as JSON or Markdown.
//!
//! Exit codes:
//!   0 - Success (possibly with some entries omitted)
//!   1 - Invalid arguments, configuration error, list request failure,
//!       deadline exceeded or interrupted

use anyhow::{Context, Result};
use chrono::Utc;
use dexfeed::aggregator::{Aggregator, AggregatorOptions};
use dexfeed::cli::{Args, OutputFormat};
use dexfeed::config::{Config, CONFIG_FILE_NAME};
use dexfeed::models::{PageReport, PageRequest, ReportMetadata};
use dexfeed::report;
use dexfeed::upstream::{CatalogConfig, HttpCatalog};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("Dexfeed v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {}", config_source);

    let quiet = args.quiet;
    if let Err(e) = run(args, config).await {
        // The subscriber also writes to stderr; under --quiet the plain line is enough.
        if !quiet {
            error!("Request failed: {:#}", e);
        }
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .dexfeed.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .dexfeed.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .dexfeed.toml")?;

    println!("✅ Created .dexfeed.toml with default settings.");
    println!("   Edit it to change the upstream URL, concurrency and deadline.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout only carries the rendered page.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fetch, aggregate and render one page.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();
    let request = args.page_request(config.fetch.default_limit);

    let catalog = HttpCatalog::new(CatalogConfig::from(&config.upstream))?;
    let source = catalog.list_url();
    let options = AggregatorOptions::from(&config.fetch);

    info!("Source: {}", source);
    debug!(
        "Concurrency: {}, deadline: {:?}",
        options.concurrency, options.deadline
    );

    let aggregator = Aggregator::new(catalog, options);

    let spinner = make_spinner(args.quiet, &request);
    let result = aggregator.aggregate_until(request, shutdown_signal()).await;
    spinner.finish_and_clear();

    let items = result.with_context(|| format!("Failed to aggregate {}", request))?;

    let report = PageReport {
        metadata: ReportMetadata {
            source,
            page: request.page,
            limit: request.limit,
            offset: request.offset(),
            fetched_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        items,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            info!("Wrote {} entries to {}", report.len(), path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Resolves when the user presses Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Spinner on stderr while the page is being fetched.
fn make_spinner(quiet: bool, request: &PageRequest) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Fetching {}", request));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
///
/// Returns the configuration and a description of where it came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location; a broken default file is not fatal
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
