use crate::url::domain::normalize_host;
use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a URL before it enters a frontier
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http and https
/// 3. Require a host
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, keeping the order of the rest
/// 6. Remove an empty query string
///
/// Host, scheme and path are left as they are: the result is still the URL
/// that gets requested.
///
/// # Examples
///
/// ```
/// use word_ripple::url::normalize_url;
///
/// let url = normalize_url("https://example.com/page?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Applies [`normalize_url`] rules to an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Builds the starting URL for a domain entry
///
/// Bare domains start on `https://<domain>/`. Entries that already carry a
/// scheme (`http://host:port`) are used as given.
///
/// ```
/// use word_ripple::url::seed_url;
///
/// assert_eq!(seed_url("example.com").unwrap().as_str(), "https://example.com/");
/// assert_eq!(seed_url("http://localhost:8080").unwrap().as_str(), "http://localhost:8080/");
/// ```
pub fn seed_url(domain: &str) -> Result<Url, UrlError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    if domain.contains("://") {
        normalize_url(domain)
    } else {
        normalize_url(&format!("https://{}/", domain.trim_end_matches('/')))
    }
}

/// Returns the insecure twin of an https URL, or None for any other scheme
///
/// Host, port, path and query are preserved.
pub fn downgrade_url(url: &Url) -> Option<Url> {
    if url.scheme() != "https" {
        return None;
    }
    let mut fallback = url.clone();
    fallback.set_scheme("http").ok()?;
    Some(fallback)
}

/// Key identifying a page within its domain's visited-set
///
/// Scheme and a `www.` prefix do not distinguish pages, so a page reached
/// once over https and once over the http fallback is only visited once.
pub fn visit_key(url: &Url) -> String {
    let host = url.host_str().map(normalize_host).unwrap_or_default();
    let mut key = host;
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push_str(url.path());
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
