//! State module for tracking crawl progress
//!
//! This module provides the per-domain state used during a crawl.
//!
//! # Components
//!
//! - `Frontier`: per-domain FIFO queue, visited-set and page cap
//! - `CrawlTask`: one page of a domain waiting to be fetched
//! - `DomainPhase`: lifecycle of a domain (seeded, active, exhausted, capped)

mod domain_phase;
mod frontier;

// Re-export main types
pub use domain_phase::DomainPhase;
pub use frontier::{CrawlTask, Frontier};
