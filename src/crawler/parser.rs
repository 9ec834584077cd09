//! HTML parser for extracting links and visible text
//!
//! This module handles parsing HTML content to extract:
//! - Same-domain links to follow (from <a> tags)
//! - Visible text for word matching

use crate::url::{normalize_parsed, same_domain};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Visible text, one space between text nodes
    pub text: String,

    /// Same-domain links in document order, without duplicates
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts links and visible text
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - Links whose normalized host differs from the base URL's
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and any other non-HTTP(S) scheme
/// - Fragment-only links
///
/// Malformed hrefs are skipped; parsing never fails.
///
/// # Example
///
/// ```
/// use word_ripple::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert!(parsed.text.contains("Link"));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        text: visible_text(&document),
        links: collect_links(&document, base_url),
    }
}

/// Returns the same-domain links of a page
pub fn extract_links(base_url: &Url, html: &str) -> Vec<Url> {
    collect_links(&Html::parse_document(html), base_url)
}

/// Collects the text a reader would see, skipping hidden elements
///
/// Walks the tree with an explicit stack so deeply nested markup cannot
/// exhaust the call stack.
fn visible_text(document: &Html) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    let mut stack = vec![*document.root_element()];

    while let Some(node) = stack.pop() {
        if let Some(element) = ElementRef::wrap(node) {
            if HIDDEN_ELEMENTS.contains(&element.value().name()) {
                continue;
            }
        } else if let Some(text) = node.value().as_text() {
            let piece = text.trim();
            if !piece.is_empty() {
                pieces.push(piece);
            }
            continue;
        }

        stack.extend(node.children().rev());
    }

    pieces.join(" ")
}

/// Extracts the valid same-domain links of the HTML document
fn collect_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(link) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        if !same_domain(&link, base_url) {
            continue;
        }

        if seen.insert(link.as_str().to_string()) {
            links.push(link);
        }
    }

    links
}

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    normalize_parsed(absolute_url).ok()
}
