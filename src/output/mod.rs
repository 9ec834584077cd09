//! Output module for match results and crawl reports
//!
//! This module handles:
//! - Collecting matches from concurrent workers
//! - Exporting matches as CSV
//! - Summarizing crawl statistics
//! - Writing sample input files

pub mod csv;
mod samples;
mod sink;
pub mod stats;

pub use csv::{write_results, write_results_csv};
pub use samples::{create_sample_files, DOMAIN_LIST_FILE, SAMPLE_DOMAINS, SAMPLE_WORDS, WORD_LIST_FILE};
pub use sink::{MatchResult, ResultSink};
pub use stats::{print_statistics, CrawlStatistics};
