use url::Url;

/// Normalizes a host for same-domain comparison
///
/// The host is lowercased, a trailing root dot is dropped and a leading
/// `www.` label is stripped, so `WWW.Example.com.` and `example.com` compare
/// equal.
///
/// ```
/// use word_ripple::url::normalize_host;
///
/// assert_eq!(normalize_host("WWW.Example.com."), "example.com");
/// ```
pub fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => host,
    }
}

/// Returns true if both URLs point at the same normalized host
///
/// Scheme and port are ignored: `https://example.com` and
/// `http://www.example.com:8080` are the same domain.
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => normalize_host(ha) == normalize_host(hb),
        _ => false,
    }
}
