//! Word-Ripple main entry point
//!
//! This is the command-line interface for the Word-Ripple word-hunting crawler.

use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use word_ripple::config::{load_config_with_hash, load_list, validate, Config};
use word_ripple::crawler::crawl;
use word_ripple::output::{create_sample_files, print_statistics, write_results_csv, CrawlStatistics};

/// Word-Ripple: a domain-scoped word-hunting crawler
///
/// Word-Ripple crawls each listed domain's own pages and records every page
/// whose visible text contains one of the target words. Bangla and other
/// Unicode scripts are matched on whole-word boundaries.
#[derive(Parser, Debug)]
#[command(name = "word-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A domain-scoped word-hunting crawler", long_about = None)]
struct Cli {
    /// File with one domain per line
    #[arg(long, value_name = "FILE", required_unless_present = "create_samples")]
    domains: Option<PathBuf>,

    /// File with one target word per line
    #[arg(long, value_name = "FILE", required_unless_present = "create_samples")]
    words: Option<PathBuf>,

    /// Path for the output CSV file [default: results.csv]
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Maximum pages to crawl per domain [default: 100]
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Number of concurrent workers [default: 10]
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Delay between requests to the same domain, in milliseconds [default: 1000]
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Path to TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write sample domain_list.txt and word_list.txt and exit
    #[arg(long)]
    create_samples: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.results_path = output.clone();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages_per_domain = max_pages;
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawler.delay_ms = delay_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.create_samples {
        setup_logging(cli.verbose, cli.quiet, None)?;
        create_sample_files(Path::new("."))?;
        return Ok(());
    }

    // Load configuration before logging: the log file path lives in it
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };
    cli.apply_overrides(&mut config);
    validate(&config)?;

    setup_logging(cli.verbose, cli.quiet, Some(Path::new(&config.output.log_path)))?;

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("Using default configuration"),
    }

    let (Some(domains_path), Some(words_path)) = (&cli.domains, &cli.words) else {
        return Err("--domains and --words are required".into());
    };
    let domains = load_list(domains_path)?;
    let words = load_list(words_path)?;
    tracing::info!(
        "Loaded {} domain(s) from {} and {} word(s) from {}",
        domains.len(),
        domains_path.display(),
        words.len(),
        words_path.display()
    );

    handle_crawl(&config, &domains, &words).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stderr and, when a path is given, are appended to that file
/// without ANSI colors.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("word_ripple=info,warn"),
            1 => EnvFilter::new("word_ripple=debug,info"),
            2 => EnvFilter::new("word_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    domains: &[String],
    words: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Max pages per domain: {}, workers: {}, delay: {}ms",
        config.crawler.max_pages_per_domain,
        config.crawler.workers,
        config.crawler.delay_ms
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            on_signal.cancel();
        }
    });

    let report = match crawl(config, domains, words, cancel).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    // Partial results are still written after an interrupt
    write_results_csv(&config.output.results_path, &report.matches)?;
    tracing::info!("Total matches found: {}", report.matches.len());

    print_statistics(&CrawlStatistics::from_report(&report));

    Ok(())
}
