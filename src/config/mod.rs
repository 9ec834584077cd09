//! Configuration module for Word-Ripple
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and loading the domain and word list files.
//!
//! # Example
//!
//! ```no_run
//! use word_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Max pages per domain: {}", config.crawler.max_pages_per_domain);
//! ```

mod lists;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use lists::{load_list, parse_list};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
