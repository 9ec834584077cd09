use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Word-Ripple
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the same defaults as the command-line flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per domain
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: u32,

    /// Size of the worker pool
    pub workers: u32,

    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Largest response body that will be read
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    /// Maximum link depth from the seed page; 0 means unlimited
    #[serde(rename = "max-depth")]
    pub max_depth: u32,
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the depth limit, or None when discovery depth is unbounded
    pub fn depth_limit(&self) -> Option<u32> {
        (self.max_depth > 0).then_some(self.max_depth)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_domain: 100,
            workers: 10,
            delay_ms: 1000,
            request_timeout_secs: 10,
            max_body_bytes: 5 * 1024 * 1024,
            max_depth: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub name: String,

    /// Version of the crawler
    pub version: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!("Mozilla/5.0 (compatible; {}/{})", self.name, self.version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "BanglaCrawler".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV file receiving match results
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Path of the log file
    #[serde(rename = "log-path")]
    pub log_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "results.csv".to_string(),
            log_path: "crawler.log".to_string(),
        }
    }
}
