//! Sitegraph main entry point
//!
//! Command-line interface for the sitegraph single-site crawler.

use anyhow::Context;
use clap::Parser;
use sitegraph::config::load_config_with_hash;
use sitegraph::crawler::Coordinator;
use sitegraph::frontier::Category;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitegraph: a single-site link-graph crawler
///
/// Crawls one domain breadth-first, classifying every discovered link as
/// internal, external, or a file resource, and persists the visited pages
/// and the link graph to SQLite.
#[derive(Parser, Debug)]
#[command(name = "sitegraph")]
#[command(version)]
#[command(about = "A single-site link-graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let mut coordinator =
        Coordinator::new(config, &config_hash).context("failed to initialize crawler")?;

    match coordinator.run().await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegraph=info,warn"),
            1 => EnvFilter::new("sitegraph=debug,info"),
            2 => EnvFilter::new("sitegraph=trace,debug"),
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

/// Shows the effective configuration without touching the network
fn print_dry_run(config: &sitegraph::Config) {
    println!("=== Sitegraph Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", config.site.domain);
    println!("  HTTPS: {}", config.site.https);
    println!("  Internal extensions: {}", config.site.internal_exts.join(", "));
    println!("  Error max: {}", config.site.error_max);

    println!("\nCrawler:");
    println!("  Method: {:?}", config.crawler.method);
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Retry on error: {}", config.crawler.retry_on_error);
    println!("  Skip crawled: {}", config.crawler.skip_crawled);
    println!("  Delay: {}s", config.crawler.delay.effective_seconds());

    println!("\nSubdomains:");
    println!("  Promotion allowed: {}", config.subdomains.allow);
    if !config.subdomains.whitelist.is_empty() {
        println!("  Whitelist: {}", config.subdomains.whitelist.join(", "));
    }
    if !config.subdomains.blacklist.is_empty() {
        println!("  Blacklist: {}", config.subdomains.blacklist.join(", "));
    }

    println!("\nLinks:");
    println!("  Random order: {}", config.links.random);
    println!("  Selector rules: {}", config.links.selectors.len());
    for rule in &config.links.selectors {
        println!("    - {} [{}]", rule.selector, rule.attributes.join(", "));
    }
    if !config.links.exclude_type.is_empty() {
        let excluded: Vec<&str> = config.links.exclude_type.iter().map(|c| c.as_str()).collect();
        println!("  Excluded categories: {}", excluded.join(", "));
    }

    let seed_count: usize = Category::ALL
        .iter()
        .map(|c| config.links.initial_urls.for_category(*c).len())
        .sum();

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nConfiguration is valid");
    if seed_count > 0 {
        println!("Would start crawling with {} seed URLs", seed_count);
    } else {
        println!(
            "Would start crawling from the domain root ({})",
            config.site.domain
        );
    }
}
