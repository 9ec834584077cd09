//! Word-Ripple: a domain-scoped word-hunting crawler
//!
//! This crate crawls each input domain's own link graph with a bounded pool of
//! workers and reports every page whose visible text contains one of a set of
//! target words. Per-domain politeness delays, page caps and a single
//! HTTPS-to-HTTP fallback are enforced by the core.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Word-Ripple operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid domain '{domain}': {source}")]
    InvalidDomain { domain: String, source: UrlError },

    #[error("Nothing to crawl: the {0} list is empty")]
    EmptyInput(&'static str),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to read list file {path}: {source}")]
    List {
        path: String,
        source: std::io::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator, CrawlReport};
pub use output::{MatchResult, ResultSink};
pub use state::{CrawlTask, DomainPhase, Frontier};
pub use crate::url::{normalize_host, normalize_url, same_domain, seed_url};
