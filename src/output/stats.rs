//! Statistics generation from a crawl report
//!
//! This module summarizes a finished run per domain and prints the summary
//! to stdout.

use crate::crawler::{CrawlReport, DomainReport};
use crate::state::DomainPhase;
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Per-domain rows, in input order
    pub domains: Vec<DomainReport>,

    /// Total completed tasks across all domains
    pub pages_fetched: u32,

    /// Tasks that ended in a failure
    pub pages_failed: u32,

    /// Number of match rows recorded
    pub total_matches: usize,

    /// Distinct target words found anywhere, with their row counts
    pub matches_by_word: HashMap<String, usize>,

    /// Count of domains by final phase
    pub domains_by_phase: HashMap<DomainPhase, usize>,

    pub cancelled: bool,

    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Builds statistics from a finished crawl
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut matches_by_word = HashMap::new();
        for result in &report.matches {
            *matches_by_word.entry(result.word.clone()).or_insert(0) += 1;
        }

        let mut domains_by_phase = HashMap::new();
        for domain in &report.domains {
            *domains_by_phase.entry(domain.phase).or_insert(0) += 1;
        }

        Self {
            domains: report.domains.clone(),
            pages_fetched: report.total_fetched(),
            pages_failed: report.total_failed(),
            total_matches: report.matches.len(),
            matches_by_word,
            domains_by_phase,
            cancelled: report.cancelled,
            elapsed: report.elapsed,
        }
    }

    /// Share of fetched pages that did not fail, in percent
    pub fn success_rate(&self) -> f64 {
        if self.pages_fetched == 0 {
            return 0.0;
        }
        let succeeded = self.pages_fetched.saturating_sub(self.pages_failed);
        succeeded as f64 / self.pages_fetched as f64 * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Domains: {}", stats.domains.len());
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Pages failed: {}", stats.pages_failed);
    println!("  Matches: {}", stats.total_matches);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    if stats.cancelled {
        println!("  Run was cancelled before completion");
    }
    println!();

    println!("Domains:");
    for domain in &stats.domains {
        println!(
            "  {}: {} fetched, {} failed, {} matches ({})",
            domain.domain, domain.pages_fetched, domain.pages_failed, domain.matches, domain.phase
        );
    }
    println!();

    if !stats.matches_by_word.is_empty() {
        println!("Matches by Word:");
        // Sort words by count (descending)
        let mut word_counts: Vec<_> = stats.matches_by_word.iter().collect();
        word_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (word, count) in word_counts {
            println!("  {}: {}", word, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched without error)",
        stats.success_rate(),
        stats.pages_fetched.saturating_sub(stats.pages_failed),
        stats.pages_fetched
    );
}
