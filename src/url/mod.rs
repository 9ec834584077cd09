//! URL handling module for Word-Ripple
//!
//! This module provides URL normalization, seed construction, host
//! normalization for same-domain checks, and the protocol downgrade used by
//! the fetcher.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{normalize_host, same_domain};
pub use normalize::{downgrade_url, normalize_parsed, normalize_url, seed_url, visit_key};
