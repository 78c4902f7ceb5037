//! Scroll-Harvest main entry point
//!
//! This is the command-line interface for the Scroll-Harvest job-listing
//! extractor.

use anyhow::{Context, Result};
use clap::Parser;
use scroll_harvest::config::{load_or_default, Config, Credentials, MetadataProvider, SinkKind};
use scroll_harvest::engine::{start_search, Orchestrator};
use scroll_harvest::output::{load_statistics, print_statistics, print_summary};
use scroll_harvest::query::build_query;
use scroll_harvest::session::{ensure_session, login};
use scroll_harvest::sink::{build_sink, SqliteSink};
use scroll_harvest::surface::ChromiumSurface;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Scroll-Harvest: an incremental job-listing extractor
///
/// Scroll-Harvest walks the paginated, infinite-scroll results of a job
/// search, extracts a record for every listing and pushes each record to
/// Airtable or a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "scroll-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental job-listing extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without opening a browser
    #[arg(long, conflicts_with_all = ["stats", "login_only"])]
    dry_run: bool,

    /// Show statistics from the SQLite sink database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "login_only"])]
    stats: bool,

    /// Log in, refresh the saved session and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    login_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    match &cli.config {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults"),
    }
    let (config, config_hash) =
        load_or_default(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.login_only {
        handle_login(&config).await
    } else {
        handle_scrape(&config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scroll_harvest=info,warn"),
            1 => EnvFilter::new("scroll_harvest=debug,info"),
            2 => EnvFilter::new("scroll_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Scroll-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Start URL: {}", config.search.start_url);
    println!("  Keywords: {}", config.search.keywords);

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    match &config.browser.chrome_path {
        Some(path) => println!("  Chromium: {}", path.display()),
        None => println!("  Chromium: autodetect"),
    }

    println!("\nSession:");
    println!("  File: {}", config.session.path);
    println!("  Exists: {}", Path::new(&config.session.path).exists());

    println!("\nTraversal:");
    println!("  Listing container: {}", config.selectors.listing_container);
    println!("  Listing item: {}", config.selectors.listing_item);
    println!(
        "  Description scroll: {}px every {}ms, stable after {} polls (ceiling {})",
        config.timing.description_scroll_increment,
        config.timing.description_settle_ms,
        config.timing.stagnant_polls,
        config.timing.max_stabilization_polls
    );
    println!(
        "  Metadata retry: {} attempts, {}ms backoff",
        config.retry.max_attempts, config.retry.backoff_ms
    );

    println!("\nMetadata ({} fields):", config.metadata.fields.len());
    let provider = match config.metadata.provider {
        MetadataProvider::Selectors => "selectors".to_string(),
        MetadataProvider::AgentQl => format!("agentql ({})", config.metadata.agentql_endpoint),
    };
    println!("  Provider: {}", provider);
    for field in &config.metadata.fields {
        println!("  - {}: {}", field.name, field.selector);
    }

    println!("\nSink:");
    match config.sink.kind {
        SinkKind::Airtable => println!("  Airtable at {}", config.sink.airtable_endpoint),
        SinkKind::Sqlite => println!("  SQLite at {}", config.sink.database_path),
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the --stats mode: shows statistics from the sink database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.sink.database_path);

    let sink = SqliteSink::open_for_stats(Path::new(&config.sink.database_path))
        .context("failed to open sink database")?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --login-only mode: logs in and rewrites the session file
async fn handle_login(config: &Config) -> Result<()> {
    let credentials = Credentials::from_env();
    let surface = ChromiumSurface::launch(&config.browser)
        .await
        .context("failed to launch Chromium")?;

    let result = async {
        let state = login(&surface, &config.session, &credentials).await?;
        state.save(Path::new(&config.session.path))?;
        tracing::info!("Saved session state to {}", config.session.path);
        Ok::<_, anyhow::Error>(())
    }
    .await;

    if let Err(e) = surface.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    result
}

/// Handles the main scrape
async fn handle_scrape(config: &Config, config_hash: &str) -> Result<()> {
    let credentials = Credentials::from_env();
    tracing::debug!("Credentials: {:?}", credentials);

    // Build the collaborators before launching the browser so that missing
    // credentials fail fast
    let query = build_query(config, &credentials).context("failed to set up metadata query")?;
    let sink = build_sink(config, &credentials, config_hash).context("failed to set up sink")?;

    let surface = ChromiumSurface::launch(&config.browser)
        .await
        .context("failed to launch Chromium")?;

    let result = async {
        ensure_session(&surface, &config.session, &credentials)
            .await
            .context("session bootstrap failed")?;
        start_search(&surface, &config.search)
            .await
            .context("search bootstrap failed")?;

        let summary = Orchestrator::new(&surface, query.as_ref(), sink.as_ref(), config)
            .run()
            .await;

        if let Err(e) = sink.finish(&summary).await {
            tracing::error!("Sink {} failed to finish: {}", sink.name(), e);
        }
        print_summary(&summary);
        Ok::<_, anyhow::Error>(())
    }
    .await;

    if let Err(e) = surface.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    result
}
